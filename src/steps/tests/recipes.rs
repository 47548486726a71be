use super::support::{Answer, Project, run};
use crate::core::store::types::TEMPLATES;
use serde_json::json;

async fn project_with(recipe: &str) -> Project {
    let project = Project::new("1.10.0").with_collections(&[TEMPLATES]).await;
    project
        .seed(TEMPLATES, json!({ "name": "report", "recipe": recipe, "content": "x" }))
        .await;
    project
}

#[tokio::test]
async fn keeping_phantom_adds_it_to_the_install() {
    let project = project_with("phantom-pdf").await;

    let run = run(
        &project,
        &[
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Select(0),
            Answer::Confirm(true),
        ],
    )
    .await;

    run.result.unwrap();
    assert_eq!(
        run.installer.calls(),
        vec![
            vec!["jsreport@2.x.x".to_string()],
            vec!["jsreport-phantom-pdf@2.x.x".to_string()],
        ]
    );
    assert_eq!(project.records(TEMPLATES).await[0]["recipe"], json!("phantom-pdf"));
    assert!(
        run.prompter
            .asked()
            .contains(&"should we install jsreport v2 (and jsreport-phantom-pdf) now?".to_string())
    );
}

#[tokio::test]
async fn switching_to_chrome_updates_templates() {
    let project = project_with("phantom-pdf").await;

    let run = run(
        &project,
        &[
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Select(1),
            Answer::Confirm(true),
        ],
    )
    .await;

    run.result.unwrap();
    assert_eq!(project.records(TEMPLATES).await[0]["recipe"], json!("chrome-pdf"));
    assert_eq!(run.installer.calls(), vec![vec!["jsreport@2.x.x".to_string()]]);
    assert!(
        run.reporter
            .warnings()
            .iter()
            .any(|w| w.contains("(\"report\")"))
    );
}

#[tokio::test]
async fn fop_install_follows_the_answer() {
    let project = project_with("fop-pdf").await;

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
    assert_eq!(
        run.installer.calls(),
        vec![
            vec!["jsreport@2.x.x".to_string()],
            vec!["jsreport-fop-pdf@2.x.x".to_string()],
        ]
    );
}

#[tokio::test]
async fn declined_fop_is_left_for_manual_install() {
    let project = project_with("fop-pdf").await;

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
    assert_eq!(run.installer.calls(), vec![vec!["jsreport@2.x.x".to_string()]]);
    assert!(run.reporter.warnings().iter().any(|w| w.contains(
        "1 templates(s) won't work in your project until you install jsreport-fop-pdf manually"
    )));
}
