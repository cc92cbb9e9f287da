use serde_json::json;

use crate::common::{TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn returns_a_token_with_the_role_permissions() {
        let app = TestApp::spawn().await;
        app.create_user_with_role("ed", "editorpass", "editor")
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "ed", "password": "editorpass"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["role"], "editor");
        let permissions: Vec<&str> = res.body["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_str().unwrap())
            .collect();
        assert!(permissions.contains(&"video:add"));
        assert!(!permissions.contains(&"video:delete"));
    }

    #[tokio::test]
    async fn rejects_a_wrong_password() {
        let app = TestApp::spawn().await;
        app.create_user_with_role("ed", "editorpass", "editor")
            .await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"username": "ed", "password": "nope"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn rejects_an_unknown_user_the_same_way() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "ghost", "password": "whatever"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn empty_username_is_a_field_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"username": " ", "password": "x"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "username");
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn returns_the_authenticated_user() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("vi", "viewerpass", "viewer").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "vi");
        assert_eq!(res.body["role"], "viewer");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod bootstrap_admin {
    use server::config::AuthConfig;

    use super::*;

    #[tokio::test]
    async fn configured_admin_is_created_once_and_can_log_in() {
        let app = TestApp::spawn().await;
        let auth = AuthConfig {
            jwt_secret: app.config.auth.jwt_secret.clone(),
            admin_username: Some("root".into()),
            admin_password: Some("rootpass".into()),
        };

        assert!(server::seed::ensure_admin_user(&app.db, &auth).await.unwrap());
        assert!(!server::seed::ensure_admin_user(&app.db, &auth).await.unwrap());

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "root", "password": "rootpass"}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "admin");
    }

    #[tokio::test]
    async fn nothing_happens_without_credentials() {
        let app = TestApp::spawn().await;

        assert!(
            !server::seed::ensure_admin_user(&app.db, &app.config.auth)
                .await
                .unwrap()
        );
    }
}
