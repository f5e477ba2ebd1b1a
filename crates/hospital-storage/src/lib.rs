//! # 医院记录存储模块
//!
//! 负责把每类记录集合以JSON数组的形式读写到文本文件。

pub mod storage;

pub use storage::*;
