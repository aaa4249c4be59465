//! Remote-data controllers and the room store against a mock review service.

mod common;

use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use common::{client_for, config_json, page_json, review_json, stats_json, PAGE_SIZE};
use room_reviews::controllers::{ConfigController, ReviewListController, StatsController};
use room_reviews::error::ErrorKind;
use room_reviews::resource::RemoteState;
use room_reviews::review::SortOrder;
use room_reviews::room::{Room, RoomCatalog};
use room_reviews::store::RoomStore;

fn room(room_id: u64, number: &str) -> Room {
    Room {
        room_id,
        room_number: number.to_string(),
        hotel_id: 1,
    }
}

#[tokio::test]
async fn list_treats_missing_room_as_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let list = ReviewListController::new(client_for(&server.uri()));
    let state = list.set_room(9).await;

    let page = state.data().unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_pages, 0);
    assert_eq!(page.size, PAGE_SIZE);
    assert!(state.error().is_none());
}

#[tokio::test]
async fn changing_sort_returns_to_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/1"))
        .and(query_param("page", "0"))
        .and(query_param("sortBy", "createdAt,desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(1, 1, 5, "Ana")],
            0,
            4,
            16,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/1"))
        .and(query_param("page", "3"))
        .and(query_param("sortBy", "createdAt,desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(16, 1, 2, "Dee")],
            3,
            4,
            16,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/1"))
        .and(query_param("page", "0"))
        .and(query_param("sortBy", "rating,asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(16, 1, 2, "Dee")],
            0,
            4,
            16,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let list = ReviewListController::new(client_for(&server.uri()));
    list.set_room(1).await;
    let state = list.set_page(3).await;
    assert_eq!(state.data().unwrap().number, 3);
    assert!(state.data().unwrap().last);

    let state = list.set_sort(SortOrder::LowestRated).await;
    assert_eq!(list.page(), 0);
    assert_eq!(list.sort(), SortOrder::LowestRated);
    assert_eq!(state.data().unwrap().number, 0);
    assert_eq!(state.data().unwrap().content[0].reviewer_name, "Dee");
}

#[tokio::test]
async fn paging_stops_at_the_bounds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/2"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(1, 2, 4, "Ana")],
            0,
            2,
            6,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/2"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(6, 2, 3, "Ben")],
            1,
            2,
            6,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let list = ReviewListController::new(client_for(&server.uri()));
    list.set_room(2).await;

    // Already on the first page.
    let state = list.previous_page().await;
    assert_eq!(state.data().unwrap().number, 0);

    let state = list.next_page().await;
    assert_eq!(state.data().unwrap().number, 1);

    // Last page: no further request.
    let state = list.next_page().await;
    assert_eq!(state.data().unwrap().number, 1);
    assert_eq!(list.page(), 1);
}

#[tokio::test]
async fn refetch_uses_the_page_in_effect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/5"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(1, 5, 4, "Ana")],
            0,
            3,
            11,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/5"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![review_json(11, 5, 1, "Cy")],
            2,
            3,
            11,
        )))
        .expect(2)
        .mount(&server)
        .await;

    let list = ReviewListController::new(client_for(&server.uri()));
    list.set_room(5).await;
    list.set_page(2).await;
    let state = list.refetch().await;

    assert_eq!(state.data().unwrap().number, 2);
    assert_eq!(list.query().unwrap().page, 2);
}

#[tokio::test]
async fn list_failure_is_reported_without_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/room/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let list = ReviewListController::new(client_for(&server.uri()));
    let state = list.set_room(3).await;

    assert!(state.data().is_none());
    assert_eq!(state.error().unwrap().kind, ErrorKind::ServerError);
    assert!(matches!(list.state(), RemoteState::Failed(_)));
}

#[tokio::test]
async fn stats_for_unknown_room_are_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/8"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let stats = StatsController::new(client_for(&server.uri()));
    let state = stats.set_room(8).await;

    let data = state.data().unwrap();
    assert_eq!(data.total_reviews, 0);
    assert_eq!(data.average_rating, None);
    assert!(data.is_empty_state());
    for rating in 1..=5 {
        assert_eq!(data.count_for(rating), 0);
    }
}

#[tokio::test]
async fn config_is_loaded_once_per_hotel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config/reviews"))
        .and(query_param("hotelId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_json(true, None)))
        .expect(2)
        .mount(&server)
        .await;

    let config = ConfigController::new(client_for(&server.uri()));
    config.set_hotel(1).await;
    // Same hotel again: no request.
    config.set_hotel(1).await;
    let state = config.refetch().await;

    assert!(state.data().unwrap().enabled);
}

#[tokio::test]
async fn store_falls_back_per_room_when_stats_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(stats_json(2, 5))
                // Finishes last: the joined list must still follow room order.
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reviews/stats/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_json(1, 3)))
        .mount(&server)
        .await;

    let catalog = RoomCatalog::new(vec![room(1, "101"), room(2, "102"), room(3, "103")]);
    let mut store = RoomStore::new(client_for(&server.uri()), catalog);
    store.load_rooms();

    let joined = store.load_rooms_with_stats().await.to_vec();
    assert_eq!(joined.len(), 3);

    assert_eq!(joined[0].room_number, "101");
    assert_eq!(joined[0].average_rating, Some(5.0));
    assert_eq!(joined[0].total_reviews, 2);

    assert_eq!(joined[1].room_number, "102");
    assert_eq!(joined[1].average_rating, None);
    assert_eq!(joined[1].total_reviews, 0);

    assert_eq!(joined[2].average_rating, Some(3.0));
    assert_eq!(joined[2].total_reviews, 1);
}
