mod common;

use axum::http::{StatusCode, header};
use serde_json::json;

use common::{
    ADMIN_PASSWORD, ADMIN_USERNAME, common_fields, test_app, test_app_with_variant,
    with_required_files,
};
use vendor_onboarding_server::models::submission::FormVariant;

#[tokio::test]
async fn health_reports_connected_store() {
    let app = test_app();
    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "healthy");
    assert_eq!(response.json()["database"], "connected");
}

#[tokio::test]
async fn first_setup_signs_the_admin_in() {
    let app = test_app();

    let status = app.get("/api/auth/setup", None).await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.json()["data"]["setupRequired"], true);

    let cookie = app.setup_admin().await;
    assert!(cookie.starts_with("vendor_session="));

    let me = app.get("/api/auth/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["data"]["username"], ADMIN_USERNAME);
    assert!(me.json()["data"].get("passwordHash").is_none());

    let status = app.get("/api/auth/setup", None).await;
    assert_eq!(status.json()["data"]["setupRequired"], false);
}

#[tokio::test]
async fn setup_cookie_is_http_only_and_lax() {
    let app = test_app();
    let response = app
        .post_json(
            "/api/auth/setup",
            json!({
                "username": ADMIN_USERNAME,
                "password": ADMIN_PASSWORD,
                "confirmPassword": ADMIN_PASSWORD,
            }),
            None,
        )
        .await;

    let set_cookie = response.set_cookie().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=604800"));
    assert!(!set_cookie.contains("Secure"));
}

#[tokio::test]
async fn second_setup_is_rejected() {
    let app = test_app();
    app.setup_admin().await;

    let response = app
        .post_json(
            "/api/auth/setup",
            json!({ "username": "intruder", "password": "Abcd1234", "confirmPassword": "Abcd1234" }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Admin account already exists");
    assert_eq!(response.json()["code"], "admin_exists");
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn closed_setup_ignores_the_body() {
    let app = test_app();
    app.setup_admin().await;

    let response = app
        .send(common::request(
            "POST",
            "/api/auth/setup",
            None,
            axum::body::Body::from("garbage"),
        ))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Admin account already exists");
    assert_eq!(response.json()["code"], "admin_exists");
}

#[tokio::test]
async fn blank_username_cannot_create_an_admin() {
    let app = test_app();
    let response = app
        .post_json(
            "/api/auth/setup",
            json!({ "username": "   ", "password": "Abcd1234", "confirmPassword": "Abcd1234" }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "validation_error");
    assert!(response.json()["fields"]["username"].is_array());
    assert_eq!(app.state.admins.count().await.unwrap(), 0);
}

#[tokio::test]
async fn setup_reports_field_errors() {
    let app = test_app();
    let response = app
        .post_json(
            "/api/auth/setup",
            json!({ "username": "admin", "password": "Abcd1234", "confirmPassword": "Abcd12345" }),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["fields"]["confirmPassword"][0], "Passwords do not match");

    let status = app.get("/api/auth/setup", None).await;
    assert_eq!(status.json()["data"]["setupRequired"], true);
}

#[tokio::test]
async fn malformed_json_is_an_invalid_request() {
    let app = test_app();
    let mut request = common::request(
        "POST",
        "/api/auth/login",
        None,
        axum::body::Body::from("{not json"),
    );
    request
        .headers_mut()
        .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "invalid_request");
}

#[tokio::test]
async fn login_flow() {
    let app = test_app();

    let early = app
        .post_json(
            "/api/auth/login",
            json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(early.status, StatusCode::FORBIDDEN);
    assert_eq!(early.json()["code"], "setup_required");

    app.setup_admin().await;

    let wrong = app
        .post_json(
            "/api/auth/login",
            json!({ "username": ADMIN_USERNAME, "password": "Wrong1234" }),
            None,
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json()["error"], "Invalid username or password");

    let invalid = app
        .post_json("/api/auth/login", json!({ "username": "ab", "password": "x" }), None)
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let ok = app
        .post_json(
            "/api/auth/login",
            json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    let cookie = ok.session_cookie().unwrap();

    let me = app.get("/api/auth/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let app = test_app();
    let cookie = app.setup_admin().await;

    let response = app
        .post_json("/api/auth/logout", json!({}), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let set_cookie = response.set_cookie().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    let anonymous = app.post_json("/api/auth/logout", json!({}), None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_need_a_session() {
    let app = test_app();

    let before_setup = app.get("/api/submissions", None).await;
    assert_eq!(before_setup.status, StatusCode::FORBIDDEN);
    assert_eq!(before_setup.json()["code"], "setup_required");

    app.setup_admin().await;

    for uri in ["/api/submissions", "/api/dashboard", "/api/files/logos/a.png"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.json()["code"], "unauthorized");
    }

    let forged = app
        .get("/api/submissions", Some("vendor_session=not-a-token"))
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let me = app.get("/api/auth/me", None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_submission_is_readable_by_admin() {
    let app = test_app();
    let cookie = app.setup_admin().await;

    let id = app.submit_valid("Layla Hassan").await;
    assert_eq!(app.stored_files(), 3);

    let response = app
        .get(&format!("/api/submissions/{id}"), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    let data = &body["data"];
    assert_eq!(data["id"], id.as_str());
    assert_eq!(data["designerName"], "Layla Hassan");
    assert_eq!(data["email"], "layla@example.com");
    assert_eq!(data["formVariant"], "stock");
    assert_eq!(data["stockAvailability"], "in-stock");
    assert_eq!(data["branchCount"], 3);
    assert!(data["storeLink"].is_null());
    for key in ["logoPath", "bankDetailsPath", "commercialRegisterPath"] {
        assert!(data[key].is_string(), "{key} should be set");
    }
    assert!(data["supplementaryDocumentPath"].is_null());
    assert!(data["logoPath"].as_str().unwrap().starts_with("logos/"));
}

#[tokio::test]
async fn policy_variant_requires_every_acknowledgement() {
    let app = test_app_with_variant(FormVariant::Policy);
    let cookie = app.setup_admin().await;

    let flags = [
        "productImagePolicy",
        "returnRefundPolicy",
        "privacyPolicy",
        "termsOfUse",
        "commissionShippingPolicy",
    ];

    let mut partial = common_fields("Layla Hassan");
    for flag in flags {
        partial = partial.text(flag, "on");
    }
    let rejected = app.post_multipart(with_required_files(partial)).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        rejected.json()["fields"]["whistleblowingPolicy"][0],
        "This policy must be accepted"
    );

    let mut complete = common_fields("Layla Hassan").text("whistleblowingPolicy", "true");
    for flag in flags {
        complete = complete.text(flag, "on");
    }
    let complete = with_required_files(complete).file(
        "taxCertificate",
        "tax.pdf",
        "application/pdf",
        b"%PDF-1.4 tax",
    );
    let accepted = app.post_multipart(complete).await;
    assert_eq!(accepted.status, StatusCode::OK, "{:?}", accepted.json());

    let id = accepted.json()["data"]["id"].as_str().unwrap().to_string();
    let record = app
        .get(&format!("/api/submissions/{id}"), Some(&cookie))
        .await
        .json();
    assert_eq!(record["data"]["formVariant"], "policy");
    assert_eq!(record["data"]["privacyPolicy"], true);
    assert!(
        record["data"]["supplementaryDocumentPath"]
            .as_str()
            .unwrap()
            .starts_with("tax-certificates/")
    );
}

#[tokio::test]
async fn invalid_submissions_leave_nothing_behind() {
    let app = test_app();
    let cookie = app.setup_admin().await;

    let bad_email = with_required_files(
        common_fields("Layla Hassan")
            .text("email", "nope")
            .text("stockAvailability", "in-stock"),
    );
    // The later "email" part overrides the valid one from common_fields
    let response = app.post_multipart(bad_email).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["fields"]["email"][0],
        "Please enter a valid email address"
    );

    let bad_logo = common_fields("Layla Hassan")
        .text("stockAvailability", "in-stock")
        .file("logo", "logo.gif", "image/gif", b"GIF89a")
        .file("bankDetails", "bank.pdf", "application/pdf", b"%PDF")
        .file("commercialRegister", "cr.pdf", "application/pdf", b"%PDF");
    let response = app.post_multipart(bad_logo).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Invalid logo file type");

    let missing_file = common_fields("Layla Hassan")
        .text("stockAvailability", "in-stock")
        .file("logo", "logo.png", "image/png", b"png")
        .file("bankDetails", "bank.pdf", "application/pdf", b"%PDF")
        .file("commercialRegister", "cr.pdf", "application/pdf", b"");
    let response = app.post_multipart(missing_file).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Missing required files");

    let bad_branches = with_required_files(
        common_fields("Layla Hassan")
            .text("stockAvailability", "in-stock")
            .text("branchCount", "two"),
    );
    let response = app.post_multipart(bad_branches).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["fields"]["branchCount"][0],
        "Must be a whole number"
    );

    assert_eq!(app.stored_files(), 0);
    let list = app.get("/api/submissions", Some(&cookie)).await;
    assert_eq!(list.json()["total"], 0);
}

#[tokio::test]
async fn oversized_logo_is_rejected() {
    let app = test_app();
    let huge = vec![0u8; 10 * 1024 * 1024 + 1];
    let form = common_fields("Layla Hassan")
        .text("stockAvailability", "in-stock")
        .file("logo", "logo.png", "image/png", &huge);

    let response = app.post_multipart(form).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json()["code"], "payload_too_large");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn delete_removes_record_and_files() {
    let app = test_app();
    let cookie = app.setup_admin().await;
    let id = app.submit_valid("Layla Hassan").await;
    assert_eq!(app.stored_files(), 3);

    let response = app
        .delete(&format!("/api/submissions/{id}"), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["data"]["removedFiles"].as_array().unwrap().len(),
        3
    );

    let gone = app
        .get(&format!("/api/submissions/{id}"), Some(&cookie))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json()["error"], "Submission not found");
    assert_eq!(app.stored_files(), 0);

    let again = app
        .delete(&format!("/api/submissions/{id}"), Some(&cookie))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let app = test_app();
    let cookie = app.setup_admin().await;

    let missing = app
        .get(
            "/api/submissions/00000000-0000-4000-8000-000000000000",
            Some(&cookie),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/api/submissions/not-a-uuid", Some(&cookie)).await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_paginates_searches_and_filters() {
    let app = test_app();
    let cookie = app.setup_admin().await;
    for designer in ["Amal Saeed", "Badr Nasser", "Huda Karim"] {
        app.submit_valid(designer).await;
    }

    let first = app
        .get("/api/submissions?page=1&pageSize=2", Some(&cookie))
        .await
        .json();
    assert_eq!(first["success"], true);
    assert_eq!(first["total"], 3);
    assert_eq!(first["totalPages"], 2);
    assert_eq!(first["pageSize"], 2);
    assert_eq!(first["data"].as_array().unwrap().len(), 2);
    assert_eq!(first["data"][0]["designerName"], "Huda Karim");

    let beyond = app
        .get("/api/submissions?page=5&pageSize=2", Some(&cookie))
        .await
        .json();
    assert!(beyond["data"].as_array().unwrap().is_empty());
    assert_eq!(beyond["total"], 3);

    let search = app
        .get("/api/submissions?search=badr", Some(&cookie))
        .await
        .json();
    assert_eq!(search["total"], 1);
    assert_eq!(search["data"][0]["designerName"], "Badr Nasser");

    let category = app
        .get("/api/submissions?category=art", Some(&cookie))
        .await
        .json();
    assert_eq!(category["total"], 0);

    for bad in ["page=0", "pageSize=0", "pageSize=101", "page=abc"] {
        let response = app
            .get(&format!("/api/submissions?{bad}"), Some(&cookie))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{bad}");
    }
}

#[tokio::test]
async fn dashboard_counts_recent_submissions() {
    let app = test_app();
    let cookie = app.setup_admin().await;
    for i in 0..6 {
        app.submit_valid(&format!("Designer {i}")).await;
    }

    let response = app.get("/api/dashboard", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let data = &body["data"];
    assert_eq!(data["totalSubmissions"], 6);
    assert_eq!(data["thisWeek"], 6);
    assert_eq!(data["thisMonth"], 6);
    assert_eq!(data["recentSubmissions"].as_array().unwrap().len(), 5);
    assert_eq!(data["recentSubmissions"][0]["designerName"], "Designer 5");
}

#[tokio::test]
async fn files_are_served_inline() {
    let app = test_app();
    let cookie = app.setup_admin().await;
    let id = app.submit_valid("Layla Hassan").await;

    let record = app
        .get(&format!("/api/submissions/{id}"), Some(&cookie))
        .await
        .json();
    let logo = record["data"]["logoPath"].as_str().unwrap().to_string();

    let response = app.get(&format!("/api/files/{logo}"), Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    let disposition = response.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("inline; filename=\""));
    assert_eq!(response.bytes, b"\x89PNG fake image");

    let missing = app
        .get("/api/files/logos/does-not-exist.png", Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let directory = app.get("/api/files/logos", Some(&cookie)).await;
    assert_eq!(directory.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_is_rejected_before_lookup() {
    let app = test_app();
    let cookie = app.setup_admin().await;

    for uri in [
        "/api/files/logos/../../secret.txt",
        "/api/files/..%2F..%2Fetc%2Fpasswd",
        "/api/files/%2Fetc%2Fpasswd",
    ] {
        let response = app.get(uri, Some(&cookie)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(response.json()["code"], "invalid_path");
    }
}

#[tokio::test]
async fn concurrent_setups_create_one_admin() {
    use tower::ServiceExt;

    let app = test_app();
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..5 {
        let router = app.router.clone();
        tasks.spawn(async move {
            let body = json!({
                "username": format!("admin{i}"),
                "password": "Abcd1234",
                "confirmPassword": "Abcd1234",
            });
            let mut request = common::request(
                "POST",
                "/api/auth/setup",
                None,
                axum::body::Body::from(body.to_string()),
            );
            request
                .headers_mut()
                .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
            router.oneshot(request).await.unwrap().status()
        });
    }

    let statuses = tasks.join_all().await;
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::BAD_REQUEST)
            .count(),
        4
    );
    assert_eq!(app.state.admins.count().await.unwrap(), 1);
}
