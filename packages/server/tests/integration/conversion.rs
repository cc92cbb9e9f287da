use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};

use ::common::ConversionStatus;
use ::common::entity::{conversion_error, video_conversion};

use crate::common::{TestApp, routes};

mod chunks {
    use super::*;

    #[tokio::test]
    async fn stores_the_chunk_under_the_video_directory() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app
            .put_bytes_with_token(&routes::video_chunk(id, 3), b"chunk-three".to_vec(), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["index"], 3);
        assert_eq!(res.body["size"], 11);
        let stored = std::path::Path::new(&app.config.storage.upload_root)
            .join(id.to_string())
            .join("3.chunk");
        assert_eq!(std::fs::read(stored).unwrap(), b"chunk-three");
    }

    #[tokio::test]
    async fn reuploading_an_index_replaces_it() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        app.put_bytes_with_token(&routes::video_chunk(id, 0), b"old".to_vec(), &token)
            .await;
        let res = app
            .put_bytes_with_token(&routes::video_chunk(id, 0), b"new".to_vec(), &token)
            .await;

        assert_eq!(res.status, 201);
        let stored = std::path::Path::new(&app.config.storage.upload_root)
            .join(id.to_string())
            .join("0.chunk");
        assert_eq!(std::fs::read(stored).unwrap(), b"new");
    }

    #[tokio::test]
    async fn oversized_chunk_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        let too_big = vec![0u8; app.config.storage.max_chunk_size as usize + 1];

        let res = app
            .put_bytes_with_token(&routes::video_chunk(id, 0), too_big, &token)
            .await;

        assert_eq!(res.status, 413);
        let stored = std::path::Path::new(&app.config.storage.upload_root)
            .join(id.to_string())
            .join("0.chunk");
        assert!(!stored.exists());
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .put_bytes_with_token(&routes::video_chunk(404, 0), b"x".to_vec(), &token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn viewer_cannot_upload_chunks() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_video(&admin, "Intro", "intro").await;
        let viewer = app.create_user_with_role("vi", "viewerpass", "viewer").await;

        let res = app
            .put_bytes_with_token(&routes::video_chunk(id, 0), b"x".to_vec(), &viewer)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod convert {
    use super::*;

    #[tokio::test]
    async fn without_a_queue_the_service_is_unavailable() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        app.put_bytes_with_token(&routes::video_chunk(id, 0), b"x".to_vec(), &token)
            .await;

        let res = app
            .post_with_token(&routes::video_convert(id), &serde_json::json!({}), &token)
            .await;

        assert_eq!(res.status, 503);
        assert_eq!(res.body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn running_conversion_cannot_be_queued_again() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        for status in [ConversionStatus::Queued, ConversionStatus::Processing] {
            let slug = status.as_str().to_lowercase();
            let id = app.create_video(&token, status.as_str(), &slug).await;
            seed_conversion(&app, id, status).await;

            let res = app
                .post_with_token(&routes::video_convert(id), &serde_json::json!({}), &token)
                .await;

            assert_eq!(res.status, 409, "{status}: {}", res.text);
            assert_eq!(res.body["code"], "CONFLICT");
        }
    }

    #[tokio::test]
    async fn failed_conversion_may_be_retried() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        seed_conversion(&app, id, ConversionStatus::Failed).await;
        app.put_bytes_with_token(&routes::video_chunk(id, 0), b"x".to_vec(), &token)
            .await;

        let res = app
            .post_with_token(&routes::video_convert(id), &serde_json::json!({}), &token)
            .await;

        // Past the state check; only the missing queue stops it here.
        assert_eq!(res.status, 503);
    }
}

async fn seed_conversion(app: &TestApp, id: i32, status: ConversionStatus) {
    video_conversion::ActiveModel {
        video_id: Set(id),
        status: Set(status),
        source_path: Set(format!("/uploads/{id}")),
        manifest_path: Set(None),
        queued_at: Set(Utc::now()),
        processed_at: Set(None),
    }
    .insert(&app.db)
    .await
    .unwrap();
}

mod status {
    use super::*;

    #[tokio::test]
    async fn never_queued_video_has_no_status() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app.get_with_token(&routes::video_conversion(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["status"].is_null());
        assert_eq!(res.body["processed"], false);
        assert_eq!(res.body["errors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn reports_completion_and_errors_newest_first() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        let now = Utc::now();

        video_conversion::ActiveModel {
            video_id: Set(id),
            status: Set(ConversionStatus::Completed),
            source_path: Set(format!("/uploads/{id}")),
            manifest_path: Set(Some(format!("/uploads/{id}/mpeg-dash/output.mpd"))),
            queued_at: Set(now - Duration::minutes(5)),
            processed_at: Set(Some(now)),
        }
        .insert(&app.db)
        .await
        .unwrap();
        for (message, age) in [("older failure", 10), ("newer failure", 7)] {
            conversion_error::ActiveModel {
                video_id: Set(id),
                job_id: Set("job".into()),
                message: Set(message.into()),
                details: Set("ffmpeg exited with status 1".into()),
                created_at: Set(now - Duration::minutes(age)),
                ..Default::default()
            }
            .insert(&app.db)
            .await
            .unwrap();
        }

        let res = app.get_with_token(&routes::video_conversion(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Completed");
        assert_eq!(res.body["processed"], true);
        assert_eq!(
            res.body["manifest_path"],
            format!("/uploads/{id}/mpeg-dash/output.mpd")
        );
        assert_eq!(res.body["errors"][0]["message"], "newer failure");
        assert_eq!(res.body["errors"][1]["message"], "older failure");
    }

    #[tokio::test]
    async fn converted_video_rejects_new_chunks() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        video_conversion::ActiveModel {
            video_id: Set(id),
            status: Set(ConversionStatus::Completed),
            source_path: Set(format!("/uploads/{id}")),
            manifest_path: Set(None),
            queued_at: Set(Utc::now()),
            processed_at: Set(Some(Utc::now())),
        }
        .insert(&app.db)
        .await
        .unwrap();

        let res = app
            .put_bytes_with_token(&routes::video_chunk(id, 0), b"x".to_vec(), &token)
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn processing_video_rejects_new_chunks() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        seed_conversion(&app, id, ConversionStatus::Processing).await;

        let res = app
            .put_bytes_with_token(&routes::video_chunk(id, 0), b"x".to_vec(), &token)
            .await;

        assert_eq!(res.status, 409);
    }
}
