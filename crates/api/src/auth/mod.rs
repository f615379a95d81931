//! Access-token handling. Tokens are issued by the identity provider; this
//! service only validates them.

pub mod jwt;
