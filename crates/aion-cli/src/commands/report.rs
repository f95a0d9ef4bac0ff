use aion_application::reporting::report_from_dir;
use std::path::Path;

pub fn run(input: &Path) -> Result<(), String> {
    let report = report_from_dir(input)?;
    println!("{report}");
    Ok(())
}
