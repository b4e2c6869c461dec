//! 요청 전처리. 현재는 Bearer 토큰 인증(`auth`)만 있습니다.

pub mod auth;
