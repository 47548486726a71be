use anyhow::Result;
use serde_json::{Value, json};
use std::collections::HashSet;
use tracing::info;

use super::StepContext;
use crate::core::assets::{self, AssetPlan};
use crate::core::batch::run_batch;
use crate::core::instance::Instance;
use crate::core::store::types::{ASSETS, AssetRecord, IMAGES, ImageRecord, TEMPLATES, TemplateRecord};
use crate::core::store::{Collection, Filter, Record, Update};
use crate::core::terminal::Progress;

pub async fn migrate_images(ctx: StepContext<'_>, instance: &Instance) -> Result<()> {
    ctx.reporter
        .info("checking images extension usage in project");

    let progress = ctx.reporter.progress("searching images in store");

    let Some(images_collection) = instance.collection(IMAGES) else {
        progress.succeed("images extension not used");
        return Ok(());
    };

    let images: Vec<ImageRecord> = images_collection
        .find_as(&Filter::all())
        .await
        .inspect_err(|_| progress.fail(None))?;

    if images.is_empty() {
        progress.succeed("no images found to migrate");
        return Ok(());
    }

    let Some(assets_collection) = instance.collection(ASSETS) else {
        progress.warn(&format!(
            "found {} image(s) but migration skipped because assets extension is not used. \
             you will need to update images to assets manually",
            images.len()
        ));
        return Ok(());
    };

    progress.stop();

    ctx.reporter.line(&format!(
        "you have {} image(s) stored. jsreport v2 doesn't support the images extension and encourages the use of assets instead.",
        images.len()
    ));

    let proceed = ctx.prompter.confirm(
        "should we migrate stored images to assets and try to update existing templates to use assets?",
        true,
    )?;

    if !proceed {
        ctx.reporter.warn(
            "user decided to not continue with migration of images. you will need to update images to assets manually",
        );
        return Ok(());
    }

    let progress = ctx.reporter.progress("migrating images to assets");
    let templates_updated = convert(
        ctx,
        instance,
        images_collection,
        assets_collection,
        &images,
        progress.as_ref(),
    )
    .await
    .inspect_err(|_| progress.fail(Some("migrating images to assets")))?;

    progress.succeed(&format!(
        "images to assets migration completed. {} image(s) migrated, {} template(s) updated",
        images.len(),
        templates_updated
    ));
    Ok(())
}

async fn convert(
    ctx: StepContext<'_>,
    instance: &Instance,
    images_collection: Collection<'_>,
    assets_collection: Collection<'_>,
    images: &[ImageRecord],
    progress: &dyn Progress,
) -> Result<usize> {
    let fanout = ctx.settings.batch_fanout;

    let existing: HashSet<String> = assets_collection
        .find_as::<AssetRecord>(&Filter::all())
        .await?
        .into_iter()
        .map(|asset| asset.name)
        .collect();

    let plan = assets::plan(images, |name| existing.contains(name));
    info!(assets = plan.assets.len(), "planned image conversion");

    progress.append(" (saving new assets)");
    run_batch(&plan.assets, fanout, move |asset| {
        let mut record = Record::new();
        record.insert("name".into(), json!(asset.name));
        record.insert("content".into(), asset.content.clone());
        async move { assets_collection.insert(record).await }
    })
    .await?;

    progress.append(" (searching assets usage in templates)");
    let updated = rewrite_templates(instance, images_collection, &plan, fanout).await?;

    run_batch(images, fanout, move |image| {
        let filter = Filter::by_id(&image.id);
        async move { images_collection.remove(&filter).await }
    })
    .await?;

    Ok(updated)
}

async fn rewrite_templates(
    instance: &Instance,
    images_collection: Collection<'_>,
    plan: &AssetPlan,
    fanout: usize,
) -> Result<usize> {
    let Some(templates_collection) = instance.collection(TEMPLATES) else {
        return Ok(0);
    };

    let live_images: HashSet<String> = images_collection
        .find_as::<ImageRecord>(&Filter::all())
        .await?
        .into_iter()
        .map(|image| image.name)
        .collect();

    let templates: Vec<TemplateRecord> = templates_collection.find_as(&Filter::all()).await?;
    let rewrites: Vec<(String, String)> = templates
        .into_iter()
        .filter_map(|template| {
            let content = template.content.as_deref()?;
            let rewritten = assets::rewrite_directives(content, &live_images, plan)?;
            Some((template.id, rewritten))
        })
        .collect();

    run_batch(&rewrites, fanout, move |(id, content)| {
        let filter = Filter::by_id(id);
        let update = Update::set("content", Value::String(content.clone()));
        async move { templates_collection.update(&filter, &update).await }
    })
    .await?;

    Ok(rewrites.len())
}
