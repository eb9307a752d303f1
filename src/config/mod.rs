//! config 模块 - 层级配置视图

pub mod bind;
pub mod factory;
pub mod view;

pub use bind::Bind;
pub use factory::ConfigFactory;
pub use view::{Config, SEPARATOR};
