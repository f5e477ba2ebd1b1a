//! # 医院记录管理模块
//!
//! 维护患者、医生、预约和病历四类内存集合，并在每次修改后写回文件。

pub mod collection;
pub mod system;

pub use collection::*;
pub use system::*;
