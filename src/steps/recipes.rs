//! Checks for recipes that v2 no longer bundles.

use anyhow::Result;
use tracing::info;

use super::StepContext;
use crate::core::batch::run_batch;
use crate::core::instance::Instance;
use crate::core::store::types::{TEMPLATES, TemplateRecord};
use crate::core::store::{Filter, Update};
use crate::core::terminal::quoted_list;

const PHANTOM_RECIPE: &str = "phantom-pdf";
const CHROME_RECIPE: &str = "chrome-pdf";
const FOP_RECIPE: &str = "fop-pdf";

const KEEP_PHANTOM: &str = "i will keep using phantom-pdf recipe in jsreport v2 \
                            (jsreport-phantom-pdf will be installed additionally to the new v2 instance)";
const SWITCH_TO_CHROME: &str = "i want to use chrome-pdf, set my templates to new recipe \
                                (you will need to check the output of each of your templates and manually adjust it if needed)";

async fn templates_using(
    ctx: StepContext<'_>,
    instance: &Instance,
    recipe: &str,
) -> Result<Vec<TemplateRecord>> {
    let progress = ctx.reporter.progress("searching templates in store");

    let Some(templates) = instance.collection(TEMPLATES) else {
        progress.succeed(&format!("no templates with {recipe} recipe found to migrate"));
        return Ok(Vec::new());
    };

    let found: Vec<TemplateRecord> = templates
        .find_as(&Filter::eq("recipe", recipe))
        .await
        .inspect_err(|_| progress.fail(None))?;

    if found.is_empty() {
        progress.succeed(&format!("no templates with {recipe} recipe found to migrate"));
    } else {
        progress.stop();
    }
    Ok(found)
}

/// Returns true when the legacy phantom engine must be installed alongside v2.
pub async fn check_phantom_pdf(ctx: StepContext<'_>, instance: &Instance) -> Result<bool> {
    ctx.reporter.info("checking phantom-pdf extension usage in project");

    let found = templates_using(ctx, instance, PHANTOM_RECIPE).await?;
    if found.is_empty() {
        return Ok(false);
    }

    ctx.reporter.line(&format!(
        "you have {} templates(s) stored using phantom-pdf recipe. \
         jsreport v2 doesn't include phantom-pdf as a default recipe but uses chrome-pdf as the new default instead. \
         These two technologies produces different output sizes and we cannot automatically convert templates \
         for you to guarantee the exact same output is produced.",
        found.len()
    ));

    let choice = ctx.prompter.select(
        "please choose what would you want to do in order to continue",
        &[KEEP_PHANTOM, SWITCH_TO_CHROME],
        0,
    )?;

    if choice == 0 {
        ctx.reporter
            .success("jsreport-phantom-pdf will be installed at the end of the migration");
        return Ok(true);
    }

    // Only reachable when the lookup above found templates.
    let Some(templates) = instance.collection(TEMPLATES) else {
        return Ok(false);
    };

    let update = Update::set("recipe", CHROME_RECIPE);
    let update = &update;
    run_batch(&found, ctx.settings.batch_fanout, move |template| {
        let filter = Filter::by_id(&template.id);
        async move { templates.update(&filter, update).await }
    })
    .await?;
    info!(count = found.len(), "templates switched to chrome-pdf");

    let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
    ctx.reporter.success(&format!(
        "{} template(s) changed from phantom-pdf to chrome-pdf recipe",
        found.len()
    ));
    ctx.reporter.warn(&format!(
        "you will need to verify the output of your templates ({}) to ensure everything is working correctly",
        quoted_list(&names)
    ));
    Ok(false)
}

/// Returns true when the operator wants fop-pdf installed alongside v2.
pub async fn check_fop_pdf(ctx: StepContext<'_>, instance: &Instance) -> Result<bool> {
    ctx.reporter.info("checking fop-pdf extension usage in project");

    let found = templates_using(ctx, instance, FOP_RECIPE).await?;
    if found.is_empty() {
        return Ok(false);
    }

    ctx.reporter.line(&format!(
        "you have {} templates(s) stored using fop-pdf recipe. \
         jsreport v2 doesn't include fop-pdf as a default recipe but it can be installed separately.",
        found.len()
    ));

    let install = ctx.prompter.confirm(
        "should we additionally install fop-pdf to the new v2 instance?",
        true,
    )?;

    if install {
        ctx.reporter
            .success("jsreport-fop-pdf will be installed at the end of the migration");
    } else {
        ctx.reporter.warn(&format!(
            "{} templates(s) won't work in your project until you install jsreport-fop-pdf manually",
            found.len()
        ));
    }
    Ok(install)
}
