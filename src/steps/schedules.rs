use anyhow::Result;
use tracing::info;

use super::StepContext;
use crate::core::batch::run_batch;
use crate::core::cron::{self, CronFinding};
use crate::core::instance::Instance;
use crate::core::prompt::PRESS_ENTER;
use crate::core::store::types::{SCHEDULES, ScheduleRecord};
use crate::core::store::{Filter, Update};
use crate::core::terminal::quoted_list;

const MIGRATE_MONTHS: &str = "change my schedules to the new cron month format";
const REVIEW_MANUALLY: &str = "i want to review my schedules and migrate them manually";

#[derive(Debug)]
struct MonthFix {
    schedule: ScheduleRecord,
    new_cron: String,
}

#[derive(Debug, Default)]
struct CronReport {
    bad_format: Vec<ScheduleRecord>,
    bad_month: Vec<MonthFix>,
}

impl CronReport {
    fn from_schedules(schedules: Vec<ScheduleRecord>) -> Self {
        let mut report = Self::default();
        for schedule in schedules {
            match cron::inspect(&schedule.cron) {
                CronFinding::BadFormat => report.bad_format.push(schedule),
                CronFinding::BadMonth { new_cron } => {
                    report.bad_month.push(MonthFix { schedule, new_cron })
                }
                CronFinding::Ok => {}
            }
        }
        report
    }

    fn is_clean(&self) -> bool {
        self.bad_format.is_empty() && self.bad_month.is_empty()
    }
}

pub async fn migrate_schedules(ctx: StepContext<'_>, instance: &Instance) -> Result<()> {
    ctx.reporter
        .info("checking scheduling extension usage in project");

    let progress = ctx.reporter.progress("searching schedules in store");

    let Some(schedules) = instance.collection(SCHEDULES) else {
        progress.succeed("scheduling extension not used");
        return Ok(());
    };

    let records: Vec<ScheduleRecord> = schedules
        .find_as(&Filter::all())
        .await
        .inspect_err(|_| progress.fail(None))?;

    if records.is_empty() {
        progress.succeed("no schedules found to migrate");
        return Ok(());
    }

    let report = CronReport::from_schedules(records);
    if report.is_clean() {
        progress.succeed("no schedules found that need updates");
        return Ok(());
    }
    progress.stop();

    if !report.bad_month.is_empty() {
        ctx.reporter.line(&format!(
            "you have {} schedule(s) stored that need updates in month format. \
             jsreport v2 has some changes about the month format of cron expressions of schedules. \
             month format is changed from \"0-11\" to \"1-12\" to match standard cron expressions.",
            report.bad_month.len()
        ));

        let choice = ctx.prompter.select(
            "please choose what would you want to do in order to continue",
            &[MIGRATE_MONTHS, REVIEW_MANUALLY],
            0,
        )?;

        if choice == 0 {
            let progress = ctx.reporter.progress("updating schedules in store");
            run_batch(&report.bad_month, ctx.settings.batch_fanout, move |fix| {
                let filter = Filter::by_id(&fix.schedule.id);
                let update = Update::set("cron", fix.new_cron.as_str());
                async move { schedules.update(&filter, &update).await }
            })
            .await
            .inspect_err(|_| progress.fail(None))?;

            info!(count = report.bad_month.len(), "schedule months shifted");
            progress.succeed(&format!(
                "schedules month format migration completed. {} schedule(s) migrated",
                report.bad_month.len()
            ));
        } else {
            let names: Vec<&str> = report
                .bad_month
                .iter()
                .map(|fix| fix.schedule.name.as_str())
                .collect();
            ctx.reporter.warn(&format!(
                "you will need to update the following schedules manually: {}",
                quoted_list(&names)
            ));
            ctx.prompter.acknowledge(PRESS_ENTER)?;
        }
    }

    if !report.bad_format.is_empty() {
        let names: Vec<&str> = report
            .bad_format
            .iter()
            .map(|schedule| schedule.name.as_str())
            .collect();
        ctx.reporter.warn(&format!(
            "you have {} schedule(s) stored that contains invalid cron format. \
             jsreport v2 now validates that schedules contain cron expressions with at least 5 or 6 parts in the string. \
             you will need to check the following schedules ({}) and update them manually.",
            names.len(),
            quoted_list(&names)
        ));
        ctx.prompter.acknowledge(PRESS_ENTER)?;
    }

    Ok(())
}
