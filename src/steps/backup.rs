use anyhow::Result;

use super::StepContext;

pub fn confirm_backup(ctx: StepContext<'_>) -> Result<bool> {
    ctx.reporter.line(
        "please make sure your jsreport app and data are backed up before continuing. \
         data can be backed up with the export feature (https://jsreport.net/learn/import-export) \
         and the app by copying your project files somewhere safe.",
    );

    let confirmed = ctx.prompter.confirm("should we continue?", false)?;
    if confirmed {
        ctx.reporter.success("user confirmed that project backup is done");
    }
    Ok(confirmed)
}
