use serde_json::json;

use crate::common::{JPEG_BYTES, PNG_BYTES, TestApp, VideoForm, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn creates_an_unpublished_video_with_zero_counters() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_form_with_token(routes::VIDEOS, VideoForm::complete("Intro", "intro"), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Intro");
        assert_eq!(res.body["slug"], "intro");
        assert_eq!(res.body["is_published"], false);
        assert!(res.body["published_at"].is_null());
        assert_eq!(res.body["num_views"], 0);
        assert_eq!(res.body["num_likes"], 0);
        assert_eq!(res.body["thumbnail"], "thumbnails/cover.png");
        assert_eq!(res.body["video"], "videos/clip.mp4");
        assert_eq!(
            res.body["thumbnail_url"],
            format!("/api/v1/videos/{}/thumbnail", res.id())
        );
    }

    #[tokio::test]
    async fn publishing_on_create_sets_published_at() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_form_with_token(
                routes::VIDEOS,
                VideoForm::complete("Intro", "intro").text("is_published", "on"),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["is_published"], true);
        assert!(res.body["published_at"].is_string());
    }

    #[tokio::test]
    async fn attaches_the_given_tags() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let rock = app.create_tag(&token, "rock").await;
        let jazz = app.create_tag(&token, "jazz").await;

        let res = app
            .post_form_with_token(
                routes::VIDEOS,
                VideoForm::complete("Intro", "intro")
                    .text("tags", &rock.to_string())
                    .text("tags", &jazz.to_string()),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(
            res.body["tags"],
            json!([{"id": jazz, "name": "jazz"}, {"id": rock, "name": "rock"}])
        );
    }

    #[tokio::test]
    async fn unknown_tag_is_a_field_error() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_form_with_token(
                routes::VIDEOS,
                VideoForm::complete("Intro", "intro").text("tags", "4242"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "tags");
    }

    #[tokio::test]
    async fn duplicate_title_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_video(&token, "Intro", "intro").await;

        let res = app
            .post_form_with_token(routes::VIDEOS, VideoForm::complete("Intro", "other"), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "DUPLICATE_VALUE");
        assert_eq!(res.body["field"], "title");
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_video(&token, "Intro", "intro").await;

        let res = app
            .post_form_with_token(routes::VIDEOS, VideoForm::complete("Other", "intro"), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["field"], "slug");
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_form_with_token(
                routes::VIDEOS,
                VideoForm::complete("Intro", "not a slug!"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "slug");
    }

    #[tokio::test]
    async fn read_only_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        for field in ["num_views", "num_likes", "published_at"] {
            let res = app
                .post_form_with_token(
                    routes::VIDEOS,
                    VideoForm::complete("Intro", "intro").text(field, "5"),
                    &token,
                )
                .await;

            assert_eq!(res.status, 400, "{field}: {}", res.text);
            assert_eq!(res.body["field"], field);
        }
    }

    #[tokio::test]
    async fn missing_video_file_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = VideoForm::default()
            .text("title", "Intro")
            .text("description", "d")
            .text("slug", "intro")
            .file("thumbnail", "cover.png", PNG_BYTES.to_vec());

        let res = app.post_form_with_token(routes::VIDEOS, form, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "video");
    }

    #[tokio::test]
    async fn thumbnail_must_be_an_image() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = VideoForm::default()
            .text("title", "Intro")
            .text("description", "d")
            .text("slug", "intro")
            .file("thumbnail", "cover.txt", b"text".to_vec())
            .file("video", "clip.mp4", b"mp4".to_vec());

        let res = app.post_form_with_token(routes::VIDEOS, form, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "thumbnail");
    }

    #[tokio::test]
    async fn text_named_like_an_image_is_not_a_thumbnail() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = VideoForm::default()
            .text("title", "Intro")
            .text("description", "d")
            .text("slug", "intro")
            .file("thumbnail", "x.png", b"just some plain text".to_vec())
            .file("video", "clip.mp4", b"mp4".to_vec());

        let res = app.post_form_with_token(routes::VIDEOS, form, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "thumbnail");
    }

    #[tokio::test]
    async fn accepts_an_image_with_a_non_ascii_name() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = VideoForm::default()
            .text("title", "Intro")
            .text("description", "d")
            .text("slug", "intro")
            .file("thumbnail", "капля.png", PNG_BYTES.to_vec())
            .file("video", "clip.mp4", b"mp4".to_vec());

        let res = app.post_form_with_token(routes::VIDEOS, form, &token).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["thumbnail"], "thumbnails/upload.png");
    }

    #[tokio::test]
    async fn same_file_names_never_overwrite_each_other() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let first = app
            .post_form_with_token(routes::VIDEOS, VideoForm::complete("One", "one"), &token)
            .await;
        let second = app
            .post_form_with_token(routes::VIDEOS, VideoForm::complete("Two", "two"), &token)
            .await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        assert_ne!(first.body["thumbnail"], second.body["thumbnail"]);
        assert_ne!(first.body["video"], second.body["video"]);
    }

    #[tokio::test]
    async fn viewer_cannot_create_videos() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("vi", "viewerpass", "viewer").await;

        let res = app
            .post_form_with_token(routes::VIDEOS, VideoForm::complete("Intro", "intro"), &token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn filters_by_search_publication_and_tag() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let tag = app.create_tag(&token, "rock").await;
        app.post_form_with_token(
            routes::VIDEOS,
            VideoForm::complete("Rock Live", "rock-live")
                .text("is_published", "true")
                .text("tags", &tag.to_string()),
            &token,
        )
        .await;
        app.create_video(&token, "Rock Demo", "rock-demo").await;
        app.create_video(&token, "Interview", "interview").await;

        let res = app
            .get_with_token(&format!("{}?search=rock", routes::VIDEOS), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 2);

        let res = app
            .get_with_token(&format!("{}?is_published=true", routes::VIDEOS), &token)
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["slug"], "rock-live");

        let res = app
            .get_with_token(&format!("{}?tag={tag}", routes::VIDEOS), &token)
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn sorts_by_title_and_paginates() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        for (title, slug) in [("B", "b"), ("C", "c"), ("A", "a")] {
            app.create_video(&token, title, slug).await;
        }

        let res = app
            .get_with_token(
                &format!("{}?sort_by=title&sort_order=asc&per_page=2", routes::VIDEOS),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
        assert_eq!(res.body["data"][0]["title"], "A");
        assert_eq!(res.body["data"][1]["title"], "B");
    }

    #[tokio::test]
    async fn huge_page_numbers_return_an_empty_page() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_video(&token, "Intro", "intro").await;

        let res = app
            .get_with_token(&format!("{}?page={}&per_page=100", routes::VIDEOS, u64::MAX), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn changes_only_the_submitted_fields() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("title", "Welcome"),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Welcome");
        assert_eq!(res.body["slug"], "intro");
        assert_eq!(res.body["video"], "videos/clip.mp4");
    }

    #[tokio::test]
    async fn published_at_is_set_once_and_kept() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let published = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("is_published", "true"),
                &token,
            )
            .await;
        assert_eq!(published.status, 200, "{}", published.text);
        let first = published.body["published_at"].clone();
        assert!(first.is_string());

        let unpublished = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("is_published", "false"),
                &token,
            )
            .await;
        assert_eq!(unpublished.body["is_published"], false);
        assert_eq!(unpublished.body["published_at"], first);

        let republished = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("is_published", "true"),
                &token,
            )
            .await;
        assert_eq!(republished.body["published_at"], first);
    }

    #[tokio::test]
    async fn replaces_the_tag_set() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let rock = app.create_tag(&token, "rock").await;
        let jazz = app.create_tag(&token, "jazz").await;
        let res = app
            .post_form_with_token(
                routes::VIDEOS,
                VideoForm::complete("Intro", "intro").text("tags", &rock.to_string()),
                &token,
            )
            .await;
        let id = res.id();

        let res = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("tags", &jazz.to_string()),
                &token,
            )
            .await;
        assert_eq!(res.body["tags"], json!([{"id": jazz, "name": "jazz"}]));

        let res = app
            .patch_form_with_token(&routes::video(id), VideoForm::default().text("tags", ""), &token)
            .await;
        assert_eq!(res.body["tags"], json!([]));
    }

    #[tokio::test]
    async fn replaces_the_thumbnail() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().file("thumbnail", "new cover.jpg", JPEG_BYTES.to_vec()),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["thumbnail"], "thumbnails/new_cover.jpg");
    }

    #[tokio::test]
    async fn keeping_its_own_title_is_not_a_duplicate() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("title", "Intro").text("slug", "intro"),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn taking_another_videos_slug_is_a_duplicate() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.create_video(&token, "Intro", "intro").await;
        let id = app.create_video(&token, "Outro", "outro").await;

        let res = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("slug", "intro"),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["field"], "slug");
    }

    #[tokio::test]
    async fn counters_cannot_be_edited() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app
            .patch_form_with_token(
                &routes::video(id),
                VideoForm::default().text("num_views", "1000"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "num_views");
        let res = app.get_with_token(&routes::video(id), &token).await;
        assert_eq!(res.body["num_views"], 0);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deletes_the_video_but_keeps_its_tags() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let tag = app.create_tag(&token, "rock").await;
        let res = app
            .post_form_with_token(
                routes::VIDEOS,
                VideoForm::complete("Intro", "intro").text("tags", &tag.to_string()),
                &token,
            )
            .await;
        let id = res.id();

        let res = app.delete_with_token(&routes::video(id), &token).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get_with_token(&routes::video(id), &token).await.status, 404);
        let res = app.get_with_token(&routes::tag(tag), &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["video_count"], 0);
    }

    #[tokio::test]
    async fn media_files_stay_unless_cleanup_is_enabled() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        let media_root = std::path::PathBuf::from(&app.config.storage.media_root);

        app.delete_with_token(&routes::video(id), &token).await;

        assert!(media_root.join("videos/clip.mp4").exists());
    }

    #[tokio::test]
    async fn cleanup_removes_media_files() {
        let app = TestApp::spawn_with(|config| config.storage.cleanup_on_delete = true).await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;
        let media_root = std::path::PathBuf::from(&app.config.storage.media_root);
        assert!(media_root.join("videos/clip.mp4").exists());

        let res = app.delete_with_token(&routes::video(id), &token).await;
        assert_eq!(res.status, 204);

        assert!(!media_root.join("videos/clip.mp4").exists());
        assert!(!media_root.join("thumbnails/cover.png").exists());
    }

    #[tokio::test]
    async fn editor_cannot_delete_videos() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_video(&admin, "Intro", "intro").await;
        let editor = app.create_user_with_role("ed", "editorpass", "editor").await;

        let res = app.delete_with_token(&routes::video(id), &editor).await;

        assert_eq!(res.status, 403);
    }
}

mod media {
    use super::*;

    #[tokio::test]
    async fn downloads_the_thumbnail_with_an_etag() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app.get_with_token(&routes::video_thumbnail(id), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.header("content-type"), Some("image/png"));
        assert!(res.text.contains("fake image"));
        let etag = res.header("etag").expect("etag header").to_string();

        let res = app
            .get_with_headers(
                &routes::video_thumbnail(id),
                &token,
                &[("If-None-Match", &etag)],
            )
            .await;
        assert_eq!(res.status, 304);
    }

    #[tokio::test]
    async fn downloads_the_video_file() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = app.create_video(&token, "Intro", "intro").await;

        let res = app.get_with_token(&routes::video_file(id), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.text, "fake mp4 payload");
        assert!(
            res.header("content-disposition")
                .unwrap()
                .contains("clip.mp4")
        );
    }

    #[tokio::test]
    async fn missing_video_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(&routes::video_file(77), &token).await;

        assert_eq!(res.status, 404);
    }
}
