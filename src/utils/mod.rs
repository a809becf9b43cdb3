//! 工具函数模块
//!
//! 注册与发现两条路径共用的地址解析和标签编解码

pub mod addr;
pub mod tags;

pub use addr::{join_host_port, local_ipv4, parse_addr, parse_listen_addr, service_id};
pub use tags::{KV_JOIN_CHAR, decode_tags, encode_tags};
