// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod apply;
pub mod delete_all;
pub mod discover;

pub use apply::apply_command;
pub use delete_all::delete_all_command;
pub use discover::discover_command;
