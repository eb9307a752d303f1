//! 组件配置相关的宏定义
//!
//! 提供从配置结构体构造组件的 From 实现

/// 为组件配置类型自动实现 From trait
///
/// 支持两种模式：
/// 1. `impl_from!(ConfigType => Type)` - 调用 Type::new(config)
/// 2. `impl_from!(ConfigType => Type, expect: "错误消息")` - 调用 Type::new(config).expect("错误消息")
#[macro_export]
macro_rules! impl_from {
    // 模式1: 直接调用 new 方法
    ($config_type:ty => $target_type:ty) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config)
            }
        }
    };

    // 模式2: 调用可能失败的 new 方法，使用 expect
    ($config_type:ty => $target_type:ty, expect: $msg:literal) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config).expect($msg)
            }
        }
    };
}
