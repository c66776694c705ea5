//! Integration Tests for the socialnet gateway
//!
//! These tests drive the gateway the way the CLI does, over RPC replica sets,
//! with several actors:
//! - Registration and login
//! - Following and unfollowing
//! - Posting, liking and commenting
//! - Newsfeed generation
//! - Commands issued without a session

use socialnet_core::api::{NewsfeedService, UserAndPostService};
use socialnet_core::config::Config;
use socialnet_core::metrics::NoopSink;
use socialnet_core::model::{PostId, UserId};
use socialnet_core::newsfeed::NewsfeedGenerator;
use socialnet_core::replica::ReplicaSet;
use socialnet_core::rpc::{
    DialOptions, NewsfeedHandler, RemoteNewsfeed, RemoteUserAndPost, RpcHandler, RpcServer,
    UserAndPostHandler,
};
use socialnet_core::storage::SqlSocialStore;
use socialnet_gateway::{Gateway, GatewayError, PostDraft, Registration, Reply, Session};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

type RemoteGateway = Gateway<ReplicaSet<RemoteUserAndPost>, ReplicaSet<RemoteNewsfeed>>;

/// Gateway wired to two user-and-post replicas and two newsfeed replicas
struct TestNetwork {
    gateway: RemoteGateway,
    #[allow(dead_code)]
    runtime: Runtime,
    #[allow(dead_code)]
    data_dir: TempDir,
}

/// Bind `handler` on an ephemeral port and serve it on `runtime`
fn serve(runtime: &Runtime, handler: Arc<dyn RpcHandler>) -> String {
    let server = runtime
        .block_on(RpcServer::bind("127.0.0.1:0", handler))
        .unwrap();
    let addr = server.local_addr().unwrap();
    runtime.spawn(server.serve());
    addr.to_string()
}

impl TestNetwork {
    fn start() -> Self {
        let runtime = Runtime::new().unwrap();
        let data_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.database_path = data_dir.path().join("social.db");
        // Feeds are read right after writes in these tests
        config.cache.enabled = false;

        let mut user_hosts = Vec::new();
        for _ in 0..2 {
            let store = Arc::new(SqlSocialStore::open(&config.store.database_path, 2).unwrap());
            let handler = Arc::new(UserAndPostHandler::new(
                Arc::new(UserAndPostService::new(store)),
                Arc::new(NoopSink),
            ));
            user_hosts.push(serve(&runtime, handler));
        }

        let mut feed_hosts = Vec::new();
        for _ in 0..2 {
            let store = Arc::new(SqlSocialStore::open(&config.store.database_path, 2).unwrap());
            let generator =
                NewsfeedGenerator::from_config(&config, store, Arc::new(NoopSink)).unwrap();
            let handler = Arc::new(NewsfeedHandler::new(
                Arc::new(NewsfeedService::new(generator)),
                Arc::new(NoopSink),
            ));
            feed_hosts.push(serve(&runtime, handler));
        }

        let options = DialOptions {
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let users =
            ReplicaSet::<RemoteUserAndPost>::dial_user_and_post(&user_hosts, &options).unwrap();
        let feed = ReplicaSet::<RemoteNewsfeed>::dial_newsfeed(&feed_hosts, &options).unwrap();

        Self {
            gateway: Gateway::new(users, feed),
            runtime,
            data_dir,
        }
    }

    /// Register `name` and log in, returning the actor
    fn join(&self, name: &str) -> TestActor {
        self.gateway
            .create_user(Registration {
                first_name: name.to_string(),
                last_name: "Tester".to_string(),
                date_of_birth: chrono::NaiveDate::from_ymd_opt(1995, 3, 14).unwrap(),
                email: format!("{}@example.com", name),
                username: name.to_string(),
                password: format!("{}-password", name),
            })
            .unwrap();

        let reply = self
            .gateway
            .login(name, &format!("{}-password", name))
            .unwrap();
        let Reply::Data(body) = reply else {
            panic!("login returned no session");
        };
        let user_id = UserId(body["session"].as_i64().unwrap());

        TestActor {
            name: name.to_string(),
            user_id,
            session: Session::for_user(user_id),
        }
    }
}

/// Test actor representing a logged-in user
struct TestActor {
    name: String,
    user_id: UserId,
    session: Session,
}

fn message(reply: Reply) -> String {
    match reply {
        Reply::Message { message } => message,
        Reply::Data(value) => panic!("expected a message, got {}", value),
    }
}

fn post_id_from(reply: Reply) -> PostId {
    let text = message(reply);
    let id = text.rsplit(' ').next().unwrap();
    id.parse().unwrap()
}

fn feed_of(network: &TestNetwork, actor: &TestActor) -> Vec<i64> {
    match network.gateway.newsfeed(&actor.session, None).unwrap() {
        Reply::Data(value) => serde_json::from_value(value).unwrap(),
        other => panic!("expected feed data, got {:?}", other),
    }
}

#[test]
fn test_followers_see_posts_in_feed() {
    let network = TestNetwork::start();
    let alice = network.join("alice");
    let bob = network.join("bob");
    let carol = network.join("carol");

    network.gateway.follow(&alice.session, bob.user_id).unwrap();
    network.gateway.follow(&alice.session, carol.user_id).unwrap();

    let draft = |text: &str| PostDraft {
        content_text: text.to_string(),
        content_image_path: None,
        visible: true,
    };
    let carol_post = post_id_from(
        network
            .gateway
            .create_post(&carol.session, draft("from carol"))
            .unwrap(),
    );
    let bob_post = post_id_from(
        network
            .gateway
            .create_post(&bob.session, draft("from bob"))
            .unwrap(),
    );

    // Followees in follow order, then each followee's posts
    assert_eq!(feed_of(&network, &alice), vec![bob_post.0, carol_post.0]);
    assert!(feed_of(&network, &bob).is_empty());

    let reply = network.gateway.followers(&bob.session, None).unwrap();
    let Reply::Data(followers) = reply else {
        panic!("expected follower list");
    };
    assert_eq!(followers[0]["username"], alice.name);
}

#[test]
fn test_unfollow_removes_posts_from_feed() {
    let network = TestNetwork::start();
    let dave = network.join("dave");
    let erin = network.join("erin");

    network.gateway.follow(&dave.session, erin.user_id).unwrap();
    network
        .gateway
        .create_post(
            &erin.session,
            PostDraft {
                content_text: "hello".to_string(),
                content_image_path: None,
                visible: true,
            },
        )
        .unwrap();
    assert_eq!(feed_of(&network, &dave).len(), 1);

    let reply = network.gateway.unfollow(&dave.session, erin.user_id).unwrap();
    assert_eq!(message(reply), "unfollow user successfully");
    assert!(feed_of(&network, &dave).is_empty());

    let reply = network.gateway.unfollow(&dave.session, erin.user_id).unwrap();
    assert_eq!(message(reply), "user not followed");
}

#[test]
fn test_likes_and_comments_show_on_post() {
    let network = TestNetwork::start();
    let frank = network.join("frank");
    let grace = network.join("grace");

    let post_id = post_id_from(
        network
            .gateway
            .create_post(
                &frank.session,
                PostDraft {
                    content_text: "rust is fun".to_string(),
                    content_image_path: Some("/img/crab.png".to_string()),
                    visible: true,
                },
            )
            .unwrap(),
    );

    network.gateway.like_post(&grace.session, post_id).unwrap();
    network.gateway.like_post(&frank.session, post_id).unwrap();
    network
        .gateway
        .comment_post(&grace.session, post_id, "agreed".to_string())
        .unwrap();

    let Reply::Data(detail) = network.gateway.get_post(post_id).unwrap() else {
        panic!("expected post detail");
    };
    assert_eq!(detail["like_count"], 2);
    assert_eq!(detail["comments"][0]["content_text"], "agreed");
    assert_eq!(detail["post"]["content_image_path"], "/img/crab.png");

    network.gateway.delete_post(&frank.session, post_id).unwrap();
    let err = network.gateway.get_post(post_id).unwrap_err();
    assert_eq!(err.to_string(), "post not found");
}

#[test]
fn test_commands_without_session_are_unauthorized() {
    let network = TestNetwork::start();
    let heidi = network.join("heidi");
    let anonymous = Session::anonymous();

    let err = network.gateway.follow(&anonymous, heidi.user_id).unwrap_err();
    assert!(matches!(err, GatewayError::Unauthorized));
    assert_eq!(err.to_string(), "unauthorized");

    // Reads addressed to an explicit user do not need a session
    assert!(network
        .gateway
        .following(&anonymous, Some(heidi.user_id))
        .is_ok());
}

#[test]
fn test_unknown_user_feed_is_bad_request() {
    let network = TestNetwork::start();

    let err = network
        .gateway
        .newsfeed(&Session::anonymous(), Some(UserId(9999)))
        .unwrap_err();

    assert!(matches!(err, GatewayError::BadRequest(_)));
    assert_eq!(err.to_string(), "user not found");
}
