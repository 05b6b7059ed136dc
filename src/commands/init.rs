use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use dao_treasury::{Address, Dao, InMemoryBank, Settings, SystemClock};

use super::{format_time, OpenDao};

/// Deploy a new DAO and persist it
pub async fn execute(settings: &Settings, state_path: &Path, admin: String, force: bool) -> Result<()> {
    let bank = Arc::new(InMemoryBank::new());
    let dao = Dao::new(
        Address::new(admin),
        &settings.dao,
        Arc::new(SystemClock),
        bank.clone(),
    )?;
    let open = OpenDao::create(state_path, dao, bank, force)?;
    open.save()?;
    let dao = &open.dao;

    println!("{}", "✅ DAO initialized".bright_green());
    println!();
    println!("  Admin:             {}", dao.admin()?.to_string().bright_yellow());
    println!("  Contributions end: {}", format_time(dao.contribution_end()?));
    println!("  Voting window:     {}s", dao.vote_time()?);
    println!("  Quorum:            {}%", dao.quorum_percent()?);
    println!("  State file:        {}", state_path.display().to_string().dimmed());

    Ok(())
}
