// Copyright (c) The tattle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use tattle_cli::TattleApp;

fn main() -> Result<()> {
    color_eyre::install()?;

    let app = TattleApp::parse();
    let code = app.exec()?;
    std::process::exit(code);
}
