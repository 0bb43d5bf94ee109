mod common;

use axum::http::StatusCode;
use blog_platform::{framework::forms, infrastructure::database::PostFilter};
use common::{png_bytes, TestApp};

#[tokio::test]
async fn test_post_detail_context() {
    let app = TestApp::new().await;
    let (author, author_token) = app.user("auth").await;
    let (reader, _) = app.user("reader").await;
    let group = app.group("Test title", "test_slug").await;
    let post = app.post(&author, "Test text", Some(&group)).await;
    app.post(&author, "Another", None).await;
    app.store().create_comment(post.id, reader.id, "First!").await.unwrap();
    app.store().create_comment(post.id, author.id, "Thanks").await.unwrap();

    let response = app.get(&format!("/posts/{}/", post.id), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let context = response.json();
    assert_eq!(context["post"]["text"], "Test text");
    assert_eq!(context["post"]["group"]["slug"], "test_slug");
    assert_eq!(context["posts_count"], 2);
    assert_eq!(context["edit_visible"], false);
    assert_eq!(context["form"]["text"], "");
    let comments: Vec<_> = context["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(comments, vec!["First!", "Thanks"]);

    let own = app
        .get(&format!("/posts/{}/", post.id), Some(&author_token))
        .await
        .json();
    assert_eq!(own["edit_visible"], true);
}

#[tokio::test]
async fn test_missing_and_malformed_post_ids_are_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.user("auth").await;

    assert_eq!(app.get("/posts/9999/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/posts/abc/", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get("/posts/9999/edit/", Some(&token)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_guest_is_sent_to_login() {
    let app = TestApp::new().await;
    let (author, _) = app.user("auth").await;
    let post = app.post(&author, "Test text", None).await;

    let create = app.get("/create/", None).await;
    assert_eq!(create.status, StatusCode::SEE_OTHER);
    assert_eq!(create.location.as_deref(), Some("/auth/login/?next=/create/"));

    let submit = app.post_form("/create/", None, &[("text", "sneaky")]).await;
    assert_eq!(submit.location.as_deref(), Some("/auth/login/?next=/create/"));
    assert_eq!(app.store().count_posts(PostFilter::All).await.unwrap(), 1);

    let edit = app.get(&format!("/posts/{}/edit/", post.id), None).await;
    assert_eq!(
        edit.location,
        Some(format!("/auth/login/?next=/posts/{}/edit/", post.id))
    );

    let feed = app.get("/follow/", None).await;
    assert_eq!(feed.location.as_deref(), Some("/auth/login/?next=/follow/"));
}

#[tokio::test]
async fn test_create_form_lists_groups() {
    let app = TestApp::new().await;
    let (_, token) = app.user("auth").await;
    app.group("Test title", "test_slug").await;

    let response = app.get("/create/", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let context = response.json();
    assert_eq!(context["is_edit"], false);
    assert_eq!(context["groups"][0]["slug"], "test_slug");
    assert_eq!(context["form"]["text"], "");
}

#[tokio::test]
async fn test_create_post_redirects_to_profile() {
    let app = TestApp::new().await;
    let (author, token) = app.user("auth").await;
    let group = app.group("Test title", "test_slug").await;

    let response = app
        .post_form(
            "/create/",
            Some(&token),
            &[("text", "New post"), ("group", &group.id.to_string())],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/profile/auth/"));

    let profile = app.get("/profile/auth/", None).await.json();
    assert_eq!(profile["posts_count"], 1);
    assert_eq!(profile["page_obj"]["items"][0]["text"], "New post");
    assert_eq!(profile["page_obj"]["items"][0]["group"]["slug"], "test_slug");

    let index = app.get("/", None).await.json();
    assert_eq!(index["page_obj"]["items"][0]["text"], "New post");

    let posts = app
        .store()
        .list_posts(PostFilter::Author(author.id), 0, 10)
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "New post");
    assert_eq!(posts[0].group.as_ref().map(|g| g.id), Some(group.id));
}

#[tokio::test]
async fn test_create_post_with_image() {
    let app = TestApp::new().await;
    let (_, token) = app.user("auth").await;
    let png = png_bytes();

    let response = app
        .post_multipart(
            "/create/",
            Some(&token),
            &[("text", "Illustrated"), ("group", "")],
            Some(("small.png", &png)),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let posts = app.store().list_posts(PostFilter::All, 0, 10).await.unwrap();
    assert_eq!(posts[0].image.as_deref(), Some("posts/small.png"));
    assert!(app.media_dir.path().join("posts/small.png").exists());

    let served = app.get("/media/posts/small.png", None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.body, png);

    let detail = app.get(&format!("/posts/{}/", posts[0].id), None).await.json();
    assert_eq!(detail["post"]["image"], "posts/small.png");
}

#[tokio::test]
async fn test_invalid_submission_re_renders_form() {
    let app = TestApp::new().await;
    let (_, token) = app.user("auth").await;

    let response = app
        .post_multipart(
            "/create/",
            Some(&token),
            &[("text", "  "), ("group", "12345")],
            Some(("notes.gif", b"not really a gif")),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let errors = &response.json()["form"]["errors"];
    assert_eq!(errors["text"][0], forms::REQUIRED);
    assert_eq!(errors["group"][0], forms::INVALID_CHOICE);
    assert_eq!(errors["image"][0], forms::INVALID_IMAGE);
    assert_eq!(app.store().count_posts(PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_author_edits_in_place() {
    let app = TestApp::new().await;
    let (author, token) = app.user("auth").await;
    let group = app.group("Test title", "test_slug").await;
    let post = app.post(&author, "Original", Some(&group)).await;
    app.store()
        .update_post(
            post.id,
            blog_platform::infrastructure::database::PostChanges {
                text: "Original".to_string(),
                group_id: Some(group.id),
                image: Some("posts/kept.png".to_string()),
            },
        )
        .await
        .unwrap();

    let form = app
        .get(&format!("/posts/{}/edit/", post.id), Some(&token))
        .await
        .json();
    assert_eq!(form["is_edit"], true);
    assert_eq!(form["post_id"], post.id);
    assert_eq!(form["form"]["text"], "Original");
    assert_eq!(form["form"]["group"], group.id);

    let response = app
        .post_form(
            &format!("/posts/{}/edit/", post.id),
            Some(&token),
            &[("text", "Edited"), ("group", "")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location, Some(format!("/posts/{}/", post.id)));

    let edited = app.store().post_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "Edited");
    assert!(edited.group.is_none());
    assert_eq!(edited.image.as_deref(), Some("posts/kept.png"));
    assert_eq!(edited.pub_date, post.pub_date);
    assert_eq!(app.store().count_posts(PostFilter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_edit_keeps_edit_flags() {
    let app = TestApp::new().await;
    let (author, token) = app.user("auth").await;
    let post = app.post(&author, "Original", None).await;

    let response = app
        .post_form(&format!("/posts/{}/edit/", post.id), Some(&token), &[("text", "")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let context = response.json();
    assert_eq!(context["is_edit"], true);
    assert_eq!(context["post_id"], post.id);
    assert_eq!(context["form"]["errors"]["text"][0], forms::REQUIRED);
}

#[tokio::test]
async fn test_non_author_cannot_edit() {
    let app = TestApp::new().await;
    let (author, _) = app.user("auth").await;
    let (_, intruder_token) = app.user("intruder").await;
    let post = app.post(&author, "Original", None).await;
    let detail = format!("/posts/{}/", post.id);

    let form = app
        .get(&format!("/posts/{}/edit/", post.id), Some(&intruder_token))
        .await;
    assert_eq!(form.status, StatusCode::SEE_OTHER);
    assert_eq!(form.location.as_deref(), Some(detail.as_str()));

    let submit = app
        .post_form(
            &format!("/posts/{}/edit/", post.id),
            Some(&intruder_token),
            &[("text", "Defaced")],
        )
        .await;
    assert_eq!(submit.location.as_deref(), Some(detail.as_str()));

    let unchanged = app.store().post_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "Original");
}

#[tokio::test]
async fn test_comments() {
    let app = TestApp::new().await;
    let (author, _) = app.user("auth").await;
    let (_, reader_token) = app.user("reader").await;
    let post = app.post(&author, "Test text", None).await;
    let comment_url = format!("/posts/{}/comment/", post.id);

    let guest = app.post_form(&comment_url, None, &[("text", "anonymous")]).await;
    assert_eq!(
        guest.location,
        Some(format!("/auth/login/?next=/posts/{}/comment/", post.id))
    );

    let blank = app.post_form(&comment_url, Some(&reader_token), &[("text", " ")]).await;
    assert_eq!(blank.location, Some(format!("/posts/{}/", post.id)));
    assert!(app.store().comments_for_post(post.id).await.unwrap().is_empty());

    let added = app
        .post_form(&comment_url, Some(&reader_token), &[("text", "Nice post")])
        .await;
    assert_eq!(added.status, StatusCode::SEE_OTHER);
    assert_eq!(added.location, Some(format!("/posts/{}/", post.id)));

    let comments = app.store().comments_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Nice post");
    assert_eq!(comments[0].author.username, "reader");

    let missing = app
        .post_form("/posts/9999/comment/", Some(&reader_token), &[("text", "hi")])
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_created_post_stays_out_of_other_groups() {
    let app = TestApp::new().await;
    let (_, token) = app.user("auth").await;
    let cats = app.group("Cats", "cats").await;
    app.group("Dogs", "dogs").await;

    let response = app
        .post_form(
            "/create/",
            Some(&token),
            &[("text", "Only for cats"), ("group", &cats.id.to_string())],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let cat_page = app.get("/group/cats/", None).await.json();
    assert_eq!(cat_page["page_obj"]["items"][0]["text"], "Only for cats");
    assert_eq!(cat_page["page_obj"]["count"], 1);

    let dog_page = app.get("/group/dogs/", None).await.json();
    assert_eq!(dog_page["page_obj"]["count"], 0);
    assert!(dog_page["page_obj"]["items"].as_array().unwrap().is_empty());
}
