use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::settings::{expand_home, save_settings};

pub fn run(global: &GlobalArgs) -> Result<()> {
    let path = global.settings_path();
    let mut settings = global.settings()?;
    settings.data_dir = expand_home(&settings.data_dir);

    save_settings(&path, &settings)?;

    println!("Wrote {}", path.display());
    println!("Data directory: {}", settings.data_dir);
    for file in settings.month_files() {
        println!("  {:<4} {}", file.month, file.path.display());
    }
    Ok(())
}
