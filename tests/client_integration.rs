//! Review client against a mock review service: paths, query parameters,
//! credentials and how failures are classified.

mod common;

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use common::{client_for, config_json, page_json, review_json, stats_json, BASIC_AUTH};
use room_reviews::error::{ErrorKind, OFFLINE_MESSAGE, UNAVAILABLE_MESSAGE, UNEXPECTED_RESPONSE_MESSAGE};
use room_reviews::review::{CreateReviewRequest, ReviewQuery, SortOrder};

#[tokio::test]
async fn config_is_requested_per_hotel_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config/reviews"))
        .and(query_param("hotelId", "2"))
        .and(header("Authorization", BASIC_AUTH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(config_json(false, Some("Renovation in progress"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = client_for(&server.uri()).get_config(2).await.unwrap();
    assert!(!config.enabled);
    assert_eq!(config.reason.as_deref(), Some("Renovation in progress"));
}

#[tokio::test]
async fn reviews_page_carries_page_size_and_sort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/7"))
        .and(query_param("page", "1"))
        .and(query_param("size", "5"))
        .and(query_param("sortBy", "rating,desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(11, 7, 5, "Ana"), review_json(12, 7, 4, "Ben")],
            1,
            3,
            12,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let query = ReviewQuery {
        page: Some(1),
        size: None,
        sort_by: Some(SortOrder::HighestRated),
    };
    let page = client_for(&server.uri())
        .get_reviews_by_room(7, &query)
        .await
        .unwrap();

    assert_eq!(page.content.len(), 2);
    assert_eq!(page.content[0].reviewer_name, "Ana");
    assert_eq!(page.number, 1);
    assert!(!page.first);
    assert!(!page.last);
}

#[tokio::test]
async fn default_query_asks_for_most_recent_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/3"))
        .and(query_param("page", "0"))
        .and(query_param("sortBy", "createdAt,desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], 0, 0, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server.uri())
        .get_reviews_by_room(3, &ReviewQuery::default())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn stats_are_parsed_with_distribution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json(3, 4)))
        .mount(&server)
        .await;

    let stats = client_for(&server.uri()).get_review_stats(4).await.unwrap();
    assert_eq!(stats.total_reviews, 3);
    assert_eq!(stats.average_rating, Some(4.0));
    assert_eq!(stats.count_for(4), 3);
    assert_eq!(stats.count_for(1), 0);
}

#[tokio::test]
async fn create_review_posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reviews"))
        .and(header("Authorization", BASIC_AUTH))
        .and(body_partial_json(json!({
            "roomId": 5,
            "bookingId": 42,
            "rating": 5,
            "reviewerEmail": "ana@example.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(review_json(99, 5, 5, "Ana")))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateReviewRequest {
        room_id: 5,
        booking_id: 42,
        rating: 5,
        comment: "Spotless and quiet, would stay again.".to_string(),
        reviewer_name: "Ana".to_string(),
        reviewer_email: "ana@example.com".to_string(),
    };
    let review = client_for(&server.uri()).create_review(&request).await.unwrap();
    assert_eq!(review.review_id, 99);
}

#[tokio::test]
async fn failures_are_classified_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Room 2 not found"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/3"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());

    let err = client.get_review_stats(1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServerError);
    assert_eq!(err.status, 503);
    assert_eq!(err.message, UNAVAILABLE_MESSAGE);
    assert!(err.is_network_or_server_error());

    let err = client.get_review_stats(2).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ResourceNotFound);
    assert_eq!(err.message, "Room 2 not found");
    assert!(!err.is_network_or_server_error());

    let err = client.get_review_stats(3).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ClientError);
    assert_eq!(err.message, "Unauthorized. Please check your credentials.");
}

#[tokio::test]
async fn validation_errors_keep_field_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reviews"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Validation failed",
            "errors": {
                "comment": ["Comment must be at least 10 characters"],
                "bookingId": "Booking does not exist"
            }
        })))
        .mount(&server)
        .await;

    let request = CreateReviewRequest {
        room_id: 1,
        booking_id: 7,
        rating: 3,
        comment: "Too short".to_string(),
        reviewer_name: "Ben".to_string(),
        reviewer_email: "ben@example.com".to_string(),
    };
    let err = client_for(&server.uri()).create_review(&request).await.unwrap_err();

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Validation failed");
    let errors = err.errors.unwrap();
    assert_eq!(errors["comment"], vec!["Comment must be at least 10 characters".to_string()]);
    assert_eq!(errors["bookingId"], vec!["Booking does not exist".to_string()]);
}

#[tokio::test]
async fn malformed_success_body_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;
    // Five reviews but no average: internally inconsistent.
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "averageRating": null,
            "totalReviews": 5,
            "ratingDistribution": {"5": 5}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    for room in [1, 2] {
        let err = client.get_review_stats(room).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.status, 502);
        assert_eq!(err.message, UNEXPECTED_RESPONSE_MESSAGE);
    }
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    // Nothing listens on port 1.
    let client = client_for("http://127.0.0.1:1");
    let err = client.get_config(1).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::NetworkError);
    assert_eq!(err.status, 0);
    assert_eq!(err.message, OFFLINE_MESSAGE);
    assert!(err.is_network_or_server_error());
}

#[tokio::test]
async fn page_index_at_the_numeric_limit_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "totalElements": 0,
            "totalPages": 1,
            "size": 5,
            "number": u32::MAX,
            "first": false,
            "last": true,
            "empty": true
        })))
        .mount(&server)
        .await;

    let page = client_for(&server.uri())
        .get_reviews_by_room(1, &ReviewQuery::default())
        .await
        .unwrap();
    assert_eq!(page.number, u32::MAX);
    assert!(page.last);
}
