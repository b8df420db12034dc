//! Command handlers organized by entity family.
//!
//! Each handler follows the same shape: validate caller input, make a
//! single store call through [`convert_result`](crate::convert::convert_result)
//! so its failures are translated by the operation's allow-list, then
//! normalize the result.
//!
//! | Module | Commands | Entities |
//! |--------|----------|----------|
//! | `instance` | 12 | Instance, info cache, instance type |
//! | `migration` | 3 | Migration |
//! | `aggregate` | 6 | Aggregate, membership, metadata |
//! | `usage` | 3 | Bandwidth and volume usage |
//! | `network` | 4 | Security groups, firewall rules, agent builds |
//! | `block_device` | 3 | Block device mappings |
//! | `service` | 1 | Service directory |
//! | `action` | 2 | Instance action events |
//! | `misc` | 2 | Ping, backdoor port |

pub mod action;
pub mod aggregate;
pub mod block_device;
pub mod instance;
pub mod migration;
pub mod misc;
pub mod network;
pub mod service;
pub mod usage;
