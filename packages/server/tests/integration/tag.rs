use serde_json::json;

use crate::common::{TestApp, VideoForm, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn admin_can_create_a_tag() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::TAGS, &json!({"name": "  music "}), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["name"], "music");
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_on_the_name_field() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_tag(&token, "music").await;

        let res = app
            .post_with_token(routes::TAGS, &json!({"name": "music"}), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "DUPLICATE_VALUE");
        assert_eq!(res.body["field"], "name");
    }

    #[tokio::test]
    async fn name_longer_than_fifty_characters_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(routes::TAGS, &json!({"name": "x".repeat(51)}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "name");
    }

    #[tokio::test]
    async fn missing_name_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.post_with_token(routes::TAGS, &json!({}), &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "name");
    }

    #[tokio::test]
    async fn viewer_cannot_create_tags() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("vi", "viewerpass", "viewer").await;

        let res = app
            .post_with_token(routes::TAGS, &json!({"name": "music"}), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn lists_by_name_and_filters_by_search() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        for name in ["rock", "Jazz", "jazz-fusion"] {
            app.create_tag(&token, name).await;
        }

        let res = app.get_with_token(routes::TAGS, &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 3);
        let names: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Jazz", "jazz-fusion", "rock"]);

        let res = app
            .get_with_token(&format!("{}?search=JAZZ", routes::TAGS), &token)
            .await;
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn sorts_descending_on_request() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        for name in ["alpha", "beta"] {
            app.create_tag(&token, name).await;
        }

        let res = app
            .get_with_token(&format!("{}?sort_order=desc", routes::TAGS), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"][0]["name"], "beta");
    }

    #[tokio::test]
    async fn huge_page_numbers_return_an_empty_page() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_tag(&token, "rock").await;

        let res = app
            .get_with_token(&format!("{}?page={}&per_page=100", routes::TAGS, u64::MAX), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .get_with_token(&format!("{}?sort_by=created_at", routes::TAGS), &token)
            .await;

        assert_eq!(res.status, 400);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn renames_a_tag() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_tag(&token, "music").await;

        let res = app
            .patch_with_token(&routes::tag(id), &json!({"name": "songs"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "songs");
    }

    #[tokio::test]
    async fn keeping_the_same_name_is_not_a_duplicate() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_tag(&token, "music").await;

        let res = app
            .patch_with_token(&routes::tag(id), &json!({"name": "music"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn taking_another_tags_name_is_a_duplicate() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_tag(&token, "music").await;
        let id = app.create_tag(&token, "news").await;

        let res = app
            .patch_with_token(&routes::tag(id), &json!({"name": "music"}), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["field"], "name");
    }

    #[tokio::test]
    async fn unknown_tag_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .patch_with_token(&routes::tag(999), &json!({"name": "x"}), &token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleting_a_tag_detaches_it_from_videos() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let tag_id = app.create_tag(&token, "music").await;
        let res = app
            .post_form_with_token(
                routes::VIDEOS,
                VideoForm::complete("Song", "song").text("tags", &tag_id.to_string()),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let video_id = res.id();

        let detail = app.get_with_token(&routes::tag(tag_id), &token).await;
        assert_eq!(detail.body["video_count"], 1);

        let res = app.delete_with_token(&routes::tag(tag_id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::video(video_id), &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["tags"], json!([]));
        assert_eq!(
            app.get_with_token(&routes::tag(tag_id), &token).await.status,
            404
        );
    }

    #[tokio::test]
    async fn editor_cannot_delete_tags() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_tag(&admin, "music").await;
        let editor = app.create_user_with_role("ed", "editorpass", "editor").await;

        let res = app.delete_with_token(&routes::tag(id), &editor).await;

        assert_eq!(res.status, 403);
    }
}
