// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! win32kd entry point: installs logging and delegates to the library CLI.

fn main() {
    env_logger::init();
    win32kd::run();
}
