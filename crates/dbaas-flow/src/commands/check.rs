use dbaas_workflow::RunFile;

use super::{CheckArgs, Outcome};
use crate::error::{CliError, Result};

pub(crate) fn run(args: &CheckArgs) -> Result<Outcome> {
    let run_file = RunFile::load(&args.config)?;
    run_file.params().validate(args.workflow)?;

    let script = run_file.engine().script();
    if !script.is_file() {
        return Err(CliError::MissingScript(script.to_path_buf()));
    }

    println!(
        "{} is a valid '{}' run file",
        args.config.display(),
        args.workflow
    );
    Ok(Outcome::Success)
}
