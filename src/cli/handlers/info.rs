//! Information display handlers (config, index names)

use crate::cli::output::*;
use crate::vector::index_name;
use crate::vector::validate_user_id;
use crate::AppConfig;
use crate::Result;

pub fn handle_config_command(config: &AppConfig) -> Result<()> {
    print_config(config);
    Ok(())
}

pub fn handle_index_name_command(user_id: &str) -> Result<()> {
    if let Err(e) = validate_user_id(user_id) {
        print_warning(&e.to_string());
    }
    println!("{}", index_name(user_id));
    Ok(())
}
