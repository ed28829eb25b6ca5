//! 저장소 전반에서 사용되는 공통 타입.

mod ident;
mod partition;

pub use ident::*;
pub use partition::*;
