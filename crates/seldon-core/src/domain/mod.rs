//! 시장 데이터 저장소의 도메인 모델.

mod exchange;
mod price;
mod ticker;

pub use exchange::*;
pub use price::*;
pub use ticker::*;
