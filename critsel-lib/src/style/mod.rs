pub mod owned_css;
pub mod sheet_css;
