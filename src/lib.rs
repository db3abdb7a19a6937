//! ChemVis クライアント
//!
//! 設備CSVをバックエンドへアップロードし、集計結果を端末に表示する。

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod gateway;
pub mod interactive;
pub mod logging;
pub mod render;
pub mod session;
