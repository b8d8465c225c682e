#[doc(hidden)]
pub use alloc::format as __format;
#[doc(hidden)]
pub use anyhow::anyhow as __anyhow;

#[macro_export]
macro_rules! error_with_location {
    ($msg:expr) => {
        $crate::util::__anyhow!("{} at {}:{}", $msg, file!(), line!())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::util::__anyhow!("{} at {}:{}", $crate::util::__format!($fmt, $($arg)*), file!(), line!())
    };
}
