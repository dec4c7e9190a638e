//! Unit tests for draftsmith modules

mod common;

mod recovery_test {
    use draftsmith::error::Error;
    use draftsmith::plan::parse_plan;
    use draftsmith::types::PatchOp;

    #[test]
    fn test_fenced_model_answer() {
        let raw = r#"Sure! Here is the plan:

```json
{
  "summary": "Add a health endpoint",
  "patches": [
    {"path": "app/api/health/route.ts", "op": "create", "content": "export const GET = () => new Response('ok');\n"}
  ]
}
```

Let me know if you need anything else."#;

        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.summary, "Add a health endpoint");
        assert_eq!(plan.patches.len(), 1);
        assert_eq!(plan.patches[0].op(), PatchOp::Create);
        assert!(plan.patches[0].content().unwrap().ends_with('\n'));
    }

    #[test]
    fn test_trailing_commas_are_repaired() {
        let raw = r#"{"summary": "s", "patches": [{"path": "a.txt", "op": "delete",},],}"#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.patches[0].op(), PatchOp::Delete);
        assert_eq!(plan.patches[0].content(), None);
    }

    #[test]
    fn test_operation_alias_accepted() {
        let raw = r#"{"summary": "s", "patches": [{"path": "a", "operation": "update", "content": "x"}]}"#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.patches[0].op(), PatchOp::Update);
    }

    #[test]
    fn test_error_kinds() {
        let cases = [
            ("I could not produce a plan.", "extraction_error"),
            ("{'summary': 'single quotes'}", "malformed_plan"),
            (r#"{"patches": []}"#, "schema_violation"),
            (r#"{"summary": "s", "patches": [{"path": "a", "op": "move"}]}"#, "schema_violation"),
            (r#"{"summary": "s", "patches": [{"path": "a", "op": "create", "content": null}]}"#, "schema_violation"),
        ];

        for (raw, kind) in cases {
            let err = parse_plan(raw).unwrap_err();
            assert_eq!(err.kind(), kind, "input: {raw}");
            assert!(err.is_pre_execution());
        }
    }

    #[test]
    fn test_violation_names_the_field() {
        let raw = r#"{"summary": "s", "patches": [
            {"path": "ok.txt", "op": "delete"},
            {"path": "bad.txt", "op": "create", "content": 42}
        ]}"#;

        match parse_plan(raw) {
            Err(Error::SchemaViolation { field, .. }) => assert_eq!(field, "patches[1].content"),
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_patch_list_is_valid_plan() {
        let plan = parse_plan(r#"{"summary": "nothing to do"}"#).unwrap();
        assert!(plan.is_empty());
    }
}

mod execute_test {
    use crate::common::{
        BASE_SHA, Call, MockPlatformService, github_config, make_plan,
    };
    use draftsmith::engine::{
        AppliedAction, EngineOptions, ExecutionOutcome, NoopProgress, ReviewOptions, Stage,
        execute_plan, open_review_request,
    };
    use draftsmith::error::Error;
    use draftsmith::types::Patch;

    async fn run(
        mock: &MockPlatformService,
        patches: Vec<Patch>,
    ) -> ExecutionOutcome {
        let plan = make_plan("Test change", patches);
        execute_plan(&plan, mock, &EngineOptions::default(), &NoopProgress).await
    }

    #[tokio::test]
    async fn test_create_on_empty_repository() {
        let mock = MockPlatformService::with_config(github_config());

        let outcome = run(&mock, vec![Patch::create("README.md", "# Hello\n")]).await;

        assert!(outcome.is_success(), "{outcome:?}");
        let branch = outcome.branch().unwrap().clone();
        assert!(branch.name.starts_with("ai/"));
        assert_eq!(branch.base, "main");
        assert_eq!(branch.base_sha, BASE_SHA);

        assert_eq!(outcome.applied().len(), 1);
        assert_eq!(outcome.applied()[0].action, AppliedAction::Created);
        assert_eq!(
            mock.file_content(&branch.name, "README.md").as_deref(),
            Some("# Hello\n")
        );
        // Base is never written
        assert_eq!(mock.file_content("main", "README.md"), None);

        match mock.mutation_calls().as_slice() {
            [Call::WriteFile { message, prior, .. }] => {
                assert_eq!(message, "feat: create README.md");
                assert_eq!(prior, &None);
            }
            other => panic!("unexpected mutations: {other:?}"),
        }
        mock.assert_create_pr_called(&branch.name, "main");
        assert_eq!(
            outcome.review_url(),
            Some("https://github.com/test/repo/pull/1")
        );
    }

    #[tokio::test]
    async fn test_update_existing_file() {
        let mock =
            MockPlatformService::with_files(github_config(), &[("src/lib.rs", "old\n")]);
        let old_sha = mock.file_sha("main", "src/lib.rs");

        let outcome = run(&mock, vec![Patch::update("src/lib.rs", "new\n")]).await;

        assert!(outcome.is_success());
        let branch = &outcome.branch().unwrap().name;
        assert_eq!(outcome.applied()[0].action, AppliedAction::Updated);
        assert_eq!(mock.file_content(branch, "src/lib.rs").as_deref(), Some("new\n"));
        assert_eq!(mock.file_content("main", "src/lib.rs").as_deref(), Some("old\n"));

        match mock.mutation_calls().as_slice() {
            [Call::WriteFile { message, prior, .. }] => {
                assert_eq!(message, "feat: update src/lib.rs");
                assert_eq!(prior, &old_sha);
            }
            other => panic!("unexpected mutations: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_of_existing_file_becomes_update() {
        let mock = MockPlatformService::with_files(github_config(), &[("a.txt", "v1")]);

        let outcome = run(&mock, vec![Patch::create("a.txt", "v2")]).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.applied()[0].action, AppliedAction::Updated);
        match mock.mutation_calls().as_slice() {
            [Call::WriteFile { message, prior, .. }] => {
                assert_eq!(message, "feat: update a.txt");
                assert!(prior.is_some());
            }
            other => panic!("unexpected mutations: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_existing_file() {
        let mock = MockPlatformService::with_files(github_config(), &[("old.txt", "x")]);

        let outcome = run(&mock, vec![Patch::delete("old.txt")]).await;

        assert!(outcome.is_success());
        let branch = &outcome.branch().unwrap().name;
        assert_eq!(outcome.applied()[0].action, AppliedAction::Deleted);
        assert_eq!(mock.file_content(branch, "old.txt"), None);
        assert!(matches!(
            mock.mutation_calls().as_slice(),
            [Call::DeleteFile { message, .. }] if message == "chore: delete old.txt"
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_file_stops_with_not_found() {
        let mock = MockPlatformService::with_files(github_config(), &[("keep.txt", "x")]);

        let outcome = run(
            &mock,
            vec![
                Patch::create("new.txt", "n"),
                Patch::delete("ghost.txt"),
                Patch::update("keep.txt", "y"),
            ],
        )
        .await;

        let failure = outcome.failure().expect("should fail");
        assert_eq!(failure.stage, Stage::Apply);
        assert_eq!(failure.failed_index, Some(1));
        assert_eq!(failure.applied_indices(), vec![0]);
        assert!(matches!(&failure.error, Error::NotFound { path } if path == "ghost.txt"));

        // No delete was attempted and the third patch never ran
        assert_eq!(mock.mutated_paths(), vec!["new.txt"]);
        assert!(mock.create_pr_calls().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_run_in_plan_order_with_fresh_lookups() {
        let mock = MockPlatformService::with_files(
            github_config(),
            &[("b.txt", "b"), ("c.txt", "c")],
        );

        let outcome = run(
            &mock,
            vec![
                Patch::create("c.txt", "c2"),
                Patch::delete("b.txt"),
                Patch::create("a.txt", "a"),
            ],
        )
        .await;
        assert!(outcome.is_success());
        let branch = outcome.branch().unwrap().name.clone();

        assert_eq!(mock.mutated_paths(), vec!["c.txt", "b.txt", "a.txt"]);
        assert_eq!(
            outcome
                .applied()
                .iter()
                .map(|p| p.index)
                .collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        // Every mutation is immediately preceded by an identity lookup of its path
        let calls = mock.calls();
        for (i, call) in calls.iter().enumerate() {
            let path = match call {
                Call::WriteFile { path, .. } | Call::DeleteFile { path, .. } => path,
                _ => continue,
            };
            assert_eq!(
                calls[i - 1],
                Call::FileIdentity {
                    branch: branch.clone(),
                    path: path.clone(),
                }
            );
        }
    }

    #[tokio::test]
    async fn test_same_path_twice_observes_first_write() {
        let mock = MockPlatformService::with_config(github_config());

        let outcome = run(
            &mock,
            vec![Patch::create("x.txt", "one"), Patch::update("x.txt", "two")],
        )
        .await;

        assert!(outcome.is_success(), "{outcome:?}");
        let applied = outcome.applied();
        assert_eq!(applied[0].action, AppliedAction::Created);
        assert_eq!(applied[1].action, AppliedAction::Updated);

        // Second write presents the SHA produced by the first
        match mock.mutation_calls().as_slice() {
            [_, Call::WriteFile { prior, .. }] => {
                assert_eq!(prior.as_deref(), applied[0].blob_sha.as_deref());
            }
            other => panic!("unexpected mutations: {other:?}"),
        }
        let branch = &outcome.branch().unwrap().name;
        assert_eq!(mock.file_content(branch, "x.txt").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_fail_fast_without_rollback() {
        let mock = MockPlatformService::with_config(github_config());
        mock.fail_write_on("b.txt", "sha mismatch");

        let outcome = run(
            &mock,
            vec![
                Patch::create("a.txt", "a"),
                Patch::create("b.txt", "b"),
                Patch::create("c.txt", "c"),
            ],
        )
        .await;

        let failure = outcome.failure().expect("should fail");
        assert_eq!(failure.stage, Stage::Apply);
        assert_eq!(failure.failed_index, Some(1));
        assert_eq!(failure.applied_indices(), vec![0]);
        assert_eq!(failure.error.kind(), "remote_write_conflict");

        // Branch and the first commit stay on the remote
        let branch = failure.branch.as_ref().unwrap();
        assert!(mock.has_branch(&branch.name));
        assert_eq!(mock.file_content(&branch.name, "a.txt").as_deref(), Some("a"));
        assert_eq!(mock.file_content(&branch.name, "c.txt"), None);

        assert_eq!(mock.mutated_paths(), vec!["a.txt", "b.txt"]);
        assert!(mock.create_pr_calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_plan_touches_nothing() {
        let mock = MockPlatformService::with_config(github_config());

        let outcome = run(&mock, vec![]).await;

        let failure = outcome.failure().expect("should fail");
        assert!(matches!(failure.error, Error::EmptyPlan));
        assert!(failure.branch.is_none());
        mock.assert_untouched();
        assert_eq!(mock.branch_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_base_branch() {
        let mock = MockPlatformService::with_config(github_config());
        mock.drop_branch("main");

        let outcome = run(&mock, vec![Patch::create("a", "a")]).await;

        let failure = outcome.failure().expect("should fail");
        assert_eq!(failure.stage, Stage::Provision);
        assert!(matches!(&failure.error, Error::BaseNotFound(b) if b == "main"));
        assert_eq!(mock.create_branch_count(), 0);
        assert!(mock.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn test_branch_name_collision() {
        let mock = MockPlatformService::with_config(github_config());
        mock.fail_create_branch(Error::BranchExists("ai/1".to_string()));

        let outcome = run(&mock, vec![Patch::create("a", "a")]).await;

        let failure = outcome.failure().expect("should fail");
        assert_eq!(failure.stage, Stage::Provision);
        assert_eq!(failure.error.kind(), "branch_exists");
        assert!(failure.branch.is_none());
        assert!(mock.mutation_calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_executions_get_distinct_branches() {
        let mock = MockPlatformService::with_config(github_config());
        let options = EngineOptions::default();
        let first = make_plan("Same summary", vec![Patch::create("a.txt", "a")]);
        let second = make_plan("Same summary", vec![Patch::create("b.txt", "b")]);

        let (a, b) = tokio::join!(
            execute_plan(&first, &mock, &options, &NoopProgress),
            execute_plan(&second, &mock, &options, &NoopProgress),
        );

        assert!(a.is_success(), "{a:?}");
        assert!(b.is_success(), "{b:?}");
        let a_branch = a.branch().unwrap().name.clone();
        let b_branch = b.branch().unwrap().name.clone();
        assert_ne!(a_branch, b_branch);
        assert_eq!(mock.file_paths(&a_branch), vec!["a.txt"]);
        assert_eq!(mock.file_paths(&b_branch), vec!["b.txt"]);
        assert_eq!(mock.create_pr_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_review_failure_keeps_branch_and_can_be_retried() {
        let mock = MockPlatformService::with_config(github_config());
        mock.fail_create_pr("validation failed");

        let plan = make_plan(
            "Add docs",
            vec![Patch::create("docs/a.md", "a"), Patch::create("docs/b.md", "b")],
        );
        let options = EngineOptions::default();
        let outcome = execute_plan(&plan, &mock, &options, &NoopProgress).await;

        let failure = outcome.failure().expect("should fail");
        assert_eq!(failure.stage, Stage::Review);
        assert_eq!(failure.error.kind(), "review_request_error");
        assert_eq!(failure.applied_indices(), vec![0, 1]);
        assert_eq!(failure.failed_index, None);

        let branch = failure.branch.clone().unwrap();
        assert_eq!(mock.file_paths(&branch.name), vec!["docs/a.md", "docs/b.md"]);

        // Retry only the last stage
        let writes_before = mock.mutation_calls().len();
        let review = open_review_request(&mock, &branch, &plan, &options.review)
            .await
            .unwrap();
        assert_eq!(review.head_ref, branch.name);
        assert_eq!(review.base_ref, "main");
        assert_eq!(mock.mutation_calls().len(), writes_before);
        assert_eq!(mock.create_pr_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_review_request_carries_summary_and_options() {
        let mock = MockPlatformService::with_config(github_config());
        let options = EngineOptions {
            review: ReviewOptions {
                title: "Bot proposal".to_string(),
                draft: true,
            },
            ..EngineOptions::default()
        };

        let plan = make_plan("Tidy up", vec![Patch::create("x.txt", "x")]);
        let outcome = execute_plan(&plan, &mock, &options, &NoopProgress).await;
        assert!(outcome.is_success());

        match mock.create_pr_calls().as_slice() {
            [Call::CreatePr { title, body, draft, .. }] => {
                assert_eq!(title, "Bot proposal");
                assert!(*draft);
                let body = body.as_deref().unwrap();
                assert!(body.starts_with("Tidy up"));
                assert!(body.contains("`create` x.txt"));
            }
            other => panic!("unexpected review calls: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_custom_base_branch() {
        let mock = MockPlatformService::with_config(github_config());
        mock.seed_file("develop", "placeholder", "");

        let options = EngineOptions {
            base_branch: "develop".to_string(),
            ..EngineOptions::default()
        };
        let plan = make_plan("s", vec![Patch::create("a", "a")]);
        let outcome = execute_plan(&plan, &mock, &options, &NoopProgress).await;

        assert!(outcome.is_success(), "{outcome:?}");
        let branch = outcome.branch().unwrap();
        assert_eq!(branch.base, "develop");
        assert_eq!(branch.base_sha, "develop-head");
        assert_eq!(mock.file_paths(&branch.name), vec!["a", "placeholder"]);
        mock.assert_create_pr_called(&branch.name, "develop");
    }
}

mod progress_test {
    use crate::common::{MockPlatformService, github_config, make_plan};
    use async_trait::async_trait;
    use draftsmith::engine::{
        AppliedPatch, EngineOptions, ProgressCallback, execute_plan,
    };
    use draftsmith::types::{Patch, PullRequest, WorkingBranch};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProgressCallback for RecordingProgress {
        async fn on_message(&self, _message: &str) {}

        async fn on_branch_created(&self, _branch: &WorkingBranch) {
            self.events.lock().unwrap().push("branch".to_string());
        }

        async fn on_patch_applied(&self, patch: &AppliedPatch, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("patch {}/{total}", patch.index));
        }

        async fn on_review_opened(&self, review: &PullRequest) {
            self.events
                .lock()
                .unwrap()
                .push(format!("review #{}", review.number));
        }
    }

    #[tokio::test]
    async fn test_progress_events_in_order() {
        let mock = MockPlatformService::with_config(github_config());
        let progress = RecordingProgress::default();
        let plan = make_plan("s", vec![Patch::create("a", "a"), Patch::create("b", "b")]);

        let outcome = execute_plan(&plan, &mock, &EngineOptions::default(), &progress).await;
        assert!(outcome.is_success());

        assert_eq!(
            *progress.events.lock().unwrap(),
            vec!["branch", "patch 0/2", "patch 1/2", "review #1"]
        );
    }
}

mod generate_test {
    use crate::common::StubCompletion;
    use draftsmith::plan::generate_plan;

    #[tokio::test]
    async fn test_generate_plan_from_model_answer() {
        let stub = StubCompletion::answering(
            "Here you go:\n{\"summary\": \"Add page\", \"patches\": [{\"path\": \"app/page.tsx\", \"op\": \"create\", \"content\": \"x\",}]}",
        );

        let plan = generate_plan(&stub, "add a landing page", Some("app/layout.tsx"))
            .await
            .unwrap();
        assert_eq!(plan.summary, "Add page");
        assert_eq!(plan.patches[0].path, "app/page.tsx");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user.contains("add a landing page"));
        assert!(requests[0].user.contains("app/layout.tsx"));
    }

    #[tokio::test]
    async fn test_without_tree() {
        let stub = StubCompletion::answering(r#"{"summary": "s", "patches": []}"#);
        generate_plan(&stub, "task", None).await.unwrap();
        assert!(stub.requests()[0].user.contains("(no tree provided)"));
    }

    #[tokio::test]
    async fn test_empty_task_skips_provider() {
        let stub = StubCompletion::answering("{}");
        let err = generate_plan(&stub, "   ", None).await.unwrap_err();
        assert_eq!(err.kind(), "config");
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_answer() {
        let stub = StubCompletion::answering("I'm sorry, I can't help with that.");
        let err = generate_plan(&stub, "task", None).await.unwrap_err();
        assert_eq!(err.kind(), "extraction_error");
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let stub = StubCompletion::failing("rate limited");
        let err = generate_plan(&stub, "task", None).await.unwrap_err();
        assert_eq!(err.kind(), "completion");
    }
}
