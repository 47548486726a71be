use super::support::{Answer, Project, run};
use crate::core::store::types::{ASSETS, IMAGES, TEMPLATES};
use serde_json::json;

#[tokio::test]
async fn images_become_assets_and_templates_are_rewritten() {
    let project = Project::new("1.10.0")
        .with_collections(&[TEMPLATES, IMAGES, ASSETS])
        .await;
    project
        .seed(
            IMAGES,
            json!({ "name": "logo", "contentType": "image/png", "content": "aGVsbG8=" }),
        )
        .await;
    project
        .seed(
            TEMPLATES,
            json!({
                "name": "invoice",
                "recipe": "chrome-pdf",
                "content": "<img src='{#image logo}'/><img src='{#image logo @encoding=base64}'/>"
            }),
        )
        .await;

    let run = run(
        &project,
        &[
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(true),
        ],
    )
    .await;

    run.result.unwrap();

    let assets = project.records(ASSETS).await;
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["name"], json!("logo.png"));
    assert_eq!(assets[0]["content"], json!("aGVsbG8="));

    let templates = project.records(TEMPLATES).await;
    assert_eq!(
        templates[0]["content"],
        json!(
            "<img src='{#asset logo.png @encoding=dataURI}'/><img src='{#asset logo.png @encoding=base64}'/>"
        )
    );

    assert!(project.records(IMAGES).await.is_empty());
    assert!(run.reporter.successes().iter().any(|s| s.contains(
        "images to assets migration completed. 1 image(s) migrated, 1 template(s) updated"
    )));
}

#[tokio::test]
async fn colliding_asset_name_gets_prefixed() {
    let project = Project::new("1.10.0")
        .with_collections(&[TEMPLATES, IMAGES, ASSETS])
        .await;
    project
        .seed(ASSETS, json!({ "name": "logo.png", "content": "b2xk" }))
        .await;
    project
        .seed(
            IMAGES,
            json!({ "name": "logo", "contentType": "image/png", "content": "bmV3" }),
        )
        .await;
    project
        .seed(
            TEMPLATES,
            json!({ "name": "t", "recipe": "html", "content": "{#image logo}" }),
        )
        .await;

    let run = run(
        &project,
        &[
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(true),
        ],
    )
    .await;

    run.result.unwrap();

    let names: Vec<_> = project
        .records(ASSETS)
        .await
        .into_iter()
        .map(|a| a["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("logo.png"), json!("image_logo.png")]);
    assert_eq!(
        project.records(TEMPLATES).await[0]["content"],
        json!("{#asset image_logo.png @encoding=dataURI}")
    );
}

#[tokio::test]
async fn declining_conversion_leaves_images_in_place() {
    let project = Project::new("1.10.0")
        .with_collections(&[TEMPLATES, IMAGES, ASSETS])
        .await;
    project
        .seed(
            IMAGES,
            json!({ "name": "logo", "contentType": "image/png", "content": "aGVsbG8=" }),
        )
        .await;

    let run = run(
        &project,
        &[
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(false),
            Answer::Confirm(true),
        ],
    )
    .await;

    run.result.unwrap();
    assert_eq!(project.records(IMAGES).await.len(), 1);
    assert!(project.records(ASSETS).await.is_empty());
    assert!(
        run.reporter
            .warnings()
            .iter()
            .any(|w| w.starts_with("user decided to not continue with migration of images"))
    );
}

#[tokio::test]
async fn images_without_assets_extension_are_skipped() {
    let project = Project::new("1.10.0")
        .with_collections(&[TEMPLATES, IMAGES])
        .await;
    project
        .seed(
            IMAGES,
            json!({ "name": "logo", "contentType": "image/png", "content": "aGVsbG8=" }),
        )
        .await;

    let run = run(
        &project,
        &[Answer::Confirm(true), Answer::Confirm(true), Answer::Confirm(true)],
    )
    .await;

    run.result.unwrap();
    assert_eq!(project.records(IMAGES).await.len(), 1);
    assert!(
        run.reporter
            .warnings()
            .iter()
            .any(|w| w.contains("assets extension is not used"))
    );
}
