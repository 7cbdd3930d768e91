// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod driver;
pub mod fetcher;
pub mod housekeeping;
pub mod selector;
