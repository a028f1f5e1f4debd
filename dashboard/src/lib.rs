pub mod api;
pub mod bootstrap;
pub mod cctv;
pub mod config;
pub mod errors;
pub mod page;
pub mod panels;
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;
