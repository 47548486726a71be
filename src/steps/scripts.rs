use anyhow::Result;

use super::StepContext;
use crate::core::instance::Instance;
use crate::core::prompt::PRESS_ENTER;
use crate::core::script::{self, ScriptFinding};
use crate::core::store::Filter;
use crate::core::store::types::{SCRIPTS, ScriptRecord};
use crate::core::terminal::quoted_list;

/// Script names grouped by the problem found in them.
#[derive(Debug, Default)]
struct ScriptReport {
    invalid: Vec<String>,
    bad_args: Vec<String>,
    using_render: Vec<String>,
}

impl ScriptReport {
    fn from_scripts(scripts: Vec<ScriptRecord>) -> Self {
        let mut report = Self::default();
        for script in scripts {
            match script::classify(&script.content) {
                ScriptFinding::Invalid => report.invalid.push(script.name),
                ScriptFinding::BadArgs => report.bad_args.push(script.name),
                ScriptFinding::UsingDeprecatedRender => report.using_render.push(script.name),
                ScriptFinding::Ok => {}
            }
        }
        report
    }

    fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.bad_args.is_empty() && self.using_render.is_empty()
    }
}

/// Detection only: scripts are never rewritten, problems are listed for manual fixing.
pub async fn check_scripts(ctx: StepContext<'_>, instance: &Instance) -> Result<()> {
    ctx.reporter.info("checking scripts extension usage in project");

    let progress = ctx.reporter.progress("searching scripts in store");

    let Some(scripts) = instance.collection(SCRIPTS) else {
        progress.succeed("scripts extension not used");
        ctx.reporter.success("all scripts are ok");
        return Ok(());
    };

    let records: Vec<ScriptRecord> = scripts
        .find_as(&Filter::all())
        .await
        .inspect_err(|_| progress.fail(None))?;

    if records.is_empty() {
        progress.succeed("no scripts found to migrate");
        ctx.reporter.success("all scripts are ok");
        return Ok(());
    }

    progress.stop();

    let report = ScriptReport::from_scripts(records);
    if report.is_clean() {
        ctx.reporter.success("all scripts are ok");
        return Ok(());
    }

    ctx.reporter.warn(
        "we found some problems in your scripts. \
         jsreport v2 has removed support for long time deprecated usage of scripts. \
         please check correct usage of scripts here https://jsreport.net/learn/scripts \
         and update your scripts manually resolving the following problems:",
    );
    ctx.reporter.blank();

    if !report.invalid.is_empty() {
        ctx.reporter.warn(&format!(
            "- scripts with no definition of beforeRender/afterRender functions: {}",
            quoted_list(&report.invalid)
        ));
    }

    if !report.bad_args.is_empty() {
        ctx.reporter.warn(&format!(
            "- scripts with beforeRender/afterRender functions but with less than 2 arguments: {}",
            quoted_list(&report.bad_args)
        ));
    }

    if !report.using_render.is_empty() {
        ctx.reporter.warn(&format!(
            "- scripts with usage of deprecated \"reporter.render\" method in request object: {}. \
             use proxy.render method from require('jsreport-proxy') instead",
            quoted_list(&report.using_render)
        ));
    }

    ctx.prompter.acknowledge(PRESS_ENTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(name: &str, content: &str) -> ScriptRecord {
        ScriptRecord {
            id: format!("id-{name}"),
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn report_groups_by_finding() {
        let report = ScriptReport::from_scripts(vec![
            script("good", "function beforeRender(req, res, done) { done() }"),
            script("empty", "var x = 1"),
            script("one-arg", "function afterRender(req) {}"),
            script(
                "nested",
                "function beforeRender(req, res) { req.reporter.render({}) }",
            ),
        ]);

        assert_eq!(report.invalid, vec!["empty"]);
        assert_eq!(report.bad_args, vec!["one-arg"]);
        assert_eq!(report.using_render, vec!["nested"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn all_ok_scripts_are_clean() {
        let report = ScriptReport::from_scripts(vec![script(
            "good",
            "function beforeRender(req, res) {}",
        )]);
        assert!(report.is_clean());
    }
}
