// SPDX-License-Identifier: MIT
//! One handler per command id.
//!
//! | id  | command              | argument grammar                          |
//! |-----|----------------------|-------------------------------------------|
//! | `C` | TypeChar             | exactly one char                          |
//! | `R` | ReplaceText          | `start:length:newCursor:reason:text`      |
//! | `M` | MoveCursor           | decimal position                          |
//! | `O` | SetOptions           | `key1=value1,key2=value2,...`             |
//! | `U` | SlowUpdate           | empty                                     |
//! | `I` | RequestInfoTip       | decimal position                          |
//! | `Y` | RequestSelfDebugData | empty                                     |

pub mod info_tip;
pub mod move_cursor;
pub mod replace_text;
pub mod self_debug;
pub mod set_options;
pub mod slow_update;
pub mod type_char;
