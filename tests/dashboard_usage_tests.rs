//! Dashboard operations end to end through the octocrab-backed API.

mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::{job_json, page, run_json, workflow_json, GitHubApiMock, OWNER, REPO};
use omnilens::github::RepoRef;
use omnilens::metrics::{DayStatus, RunnerKind, RunnerOs, Trend};

fn repo() -> RepoRef {
    RepoRef::new(OWNER, REPO)
}

#[tokio::test]
async fn test_usage_buckets_jobs_by_runner() {
    let mock = GitHubApiMock::new().await;
    let started = Utc::now() - Duration::hours(2);

    mock.mock_json(
        &GitHubApiMock::repo_path("/actions/runs"),
        page(
            "workflow_runs",
            vec![
                run_json(1, 10, "CI", "success", started, 600),
                run_json(2, 20, "Release", "failure", started + Duration::minutes(30), 300),
            ],
        ),
    )
    .await;
    mock.mock_json(
        &GitHubApiMock::repo_path("/actions/runs/1/jobs"),
        page(
            "jobs",
            vec![
                job_json(11, 1, "test (ubuntu)", &["ubuntu-latest"], started, 90),
                job_json(12, 1, "test (windows)", &["windows-latest"], started, 61),
            ],
        ),
    )
    .await;
    mock.mock_json(
        &GitHubApiMock::repo_path("/actions/runs/2/jobs"),
        page(
            "jobs",
            vec![
                job_json(21, 2, "package", &["macos-14"], started, 120),
                job_json(22, 2, "upload", &["self-hosted", "linux"], started, 600),
            ],
        ),
    )
    .await;

    let report = mock.dashboard().usage(&repo(), 7).await.unwrap();

    assert_eq!(report.repository, format!("{OWNER}/{REPO}"));
    assert_eq!(report.total_runs, 2);
    assert_eq!(report.total_jobs, 4);
    // linux 2 min, windows 2 min x2, macOS 2 min x10, self-hosted free
    assert_eq!(report.billable_minutes, 2 + 4 + 20);

    let self_hosted = report
        .runners
        .iter()
        .find(|b| b.kind == RunnerKind::SelfHosted)
        .unwrap();
    assert_eq!(self_hosted.os, RunnerOs::Linux);
    assert_eq!(self_hosted.billable_minutes, 0);
    assert_eq!(self_hosted.total_seconds, 600);

    assert_eq!(report.workflows[0].workflow_name, "Release");
    assert_eq!(report.workflows[0].billable_minutes, 20);
}

#[tokio::test]
async fn test_daily_overview_for_a_fixed_day() {
    let mock = GitHubApiMock::new().await;
    let day = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

    mock.mock_json(
        &GitHubApiMock::repo_path("/actions/workflows"),
        page(
            "workflows",
            vec![workflow_json(10, "CI", "ci.yml"), workflow_json(20, "Nightly", "nightly.yml")],
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path(GitHubApiMock::repo_path("/actions/runs")))
        .and(query_param("created", "2024-02-29..2024-03-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "workflow_runs",
            vec![
                run_json(3, 10, "CI", "failure", day + Duration::hours(15), 200),
                run_json(2, 10, "CI", "success", day + Duration::hours(9), 180),
                run_json(1, 10, "CI", "success", day - Duration::hours(3), 170),
            ],
        )))
        .mount(&mock.server)
        .await;

    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let overview = mock.dashboard().daily_overview(&repo(), date, 0).await.unwrap();

    assert_eq!(overview.workflows.len(), 2);
    let ci = &overview.workflows[0];
    assert_eq!(ci.workflow_name, "CI");
    assert_eq!(ci.status, DayStatus::Failed);
    assert_eq!(ci.trend, Trend::Regressed);
    assert_eq!(ci.run_count, 2);
    assert_eq!(overview.workflows[1].status, DayStatus::DidNotRun);
    assert_eq!(overview.total_runs, 2);
    assert_eq!(overview.total_duration_seconds, 380);
}

#[tokio::test]
async fn test_coverage_from_latest_test_run() {
    let mock = GitHubApiMock::new().await;
    let created = Utc::now() - Duration::hours(1);

    mock.mock_json(
        &GitHubApiMock::repo_path("/actions/workflows"),
        page(
            "workflows",
            vec![workflow_json(10, "Tests", "tests.yml"), workflow_json(20, "Deploy", "deploy.yml")],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(GitHubApiMock::repo_path("/actions/workflows/10/runs")))
        .and(query_param("status", "success"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            "workflow_runs",
            vec![run_json(5, 10, "Tests", "success", created, 400)],
        )))
        .expect(1)
        .mount(&mock.server)
        .await;
    mock.mock_json(
        &GitHubApiMock::repo_path("/actions/runs/5/jobs"),
        page(
            "jobs",
            vec![
                job_json(51, 5, "go", &["ubuntu-latest"], created, 100),
                job_json(52, 5, "python", &["ubuntu-latest"], created, 100),
            ],
        ),
    )
    .await;
    mock.mock_log(51, "ok  \texample.com/pkg\t0.3s\tcoverage: 70.0% of statements\n").await;
    mock.mock_log(52, "Name  Stmts  Miss  Cover\nTOTAL   300     30    90%\n").await;

    let detection = mock.dashboard().coverage(&repo(), None).await.unwrap();

    assert_eq!(detection.runs_inspected, 1);
    assert_eq!(detection.jobs.len(), 2);
    let overall = detection.overall.unwrap();
    assert_eq!(overall.run_id, 5);
    assert!((overall.percent - 80.0).abs() < 1e-9);
}
