//! Tests for the account service.

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockAuthTokenRepository, MockPasswordHasher, MockUserRepository, StoredCredentials,
};
use crate::domain::{Email, ErrorCode, Password, UserName};

type Service = UserAccountService<MockUserRepository, MockAuthTokenRepository, MockPasswordHasher>;

fn make_service(
    users: MockUserRepository,
    tokens: MockAuthTokenRepository,
    hasher: MockPasswordHasher,
) -> Service {
    UserAccountService::new(Arc::new(users), Arc::new(tokens), Arc::new(hasher))
}

fn user_with(id: i64, email: &str, flags: UserFlags) -> User {
    User::new(
        UserId::new(id),
        Email::parse(email).expect("valid email"),
        UserName::default(),
        flags,
        Utc::now(),
    )
}

#[fixture]
fn plain_hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|password| Ok(format!("hashed:{password}")));
    hasher
        .expect_verify()
        .returning(|password, encoded| Ok(encoded == format!("hashed:{password}")));
    hasher
}

fn register_request(email: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        email: Email::parse(email).expect("valid email"),
        password: Password::new("testpass123").expect("valid password"),
        name: UserName::default(),
    }
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn creation_hashes_password_and_sets_flags(plain_hasher: MockPasswordHasher, #[case] superuser: bool) {
    let mut users = MockUserRepository::new();
    users.expect_insert().times(1).returning(|new_user| {
        assert_eq!(new_user.email.as_ref(), "test@example.com");
        assert_eq!(new_user.password_hash, "hashed:testpass123");
        Ok(User::new(
            UserId::new(1),
            new_user.email.clone(),
            new_user.name.clone(),
            new_user.flags,
            Utc::now(),
        ))
    });
    let service = make_service(users, MockAuthTokenRepository::new(), plain_hasher);
    let request = register_request("Test@EXAMPLE.com");

    let user = if superuser {
        service.create_superuser(request).await
    } else {
        service.register(request).await
    }
    .expect("creation succeeds");

    assert_eq!(user.email().as_ref(), "test@example.com");
    assert!(user.is_active());
    assert_eq!(user.is_staff(), superuser);
    assert_eq!(user.is_superuser(), superuser);
}

#[rstest]
#[tokio::test]
async fn duplicate_email_is_a_field_error(plain_hasher: MockPasswordHasher) {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .returning(|new_user| Err(UserRepositoryError::duplicate_email(new_user.email.as_ref())));
    let service = make_service(users, MockAuthTokenRepository::new(), plain_hasher);

    let err = service
        .register(register_request("dup@example.com"))
        .await
        .expect_err("duplicate rejected");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details().and_then(|d| d.get("field")).and_then(|v| v.as_str()), Some("email"));
}

#[rstest]
#[case(UserRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(UserRepositoryError::query("syntax"), ErrorCode::InternalError)]
#[tokio::test]
async fn repository_failures_are_mapped(
    plain_hasher: MockPasswordHasher,
    #[case] failure: UserRepositoryError,
    #[case] expected: ErrorCode,
) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(move |_| Err(failure));
    let service = make_service(users, MockAuthTokenRepository::new(), plain_hasher);

    let err = service.profile(UserId::new(1)).await.expect_err("failure");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[case("testpass123", UserFlags::REGULAR, true)]
#[case("wrongpass", UserFlags::REGULAR, false)]
#[case(
    "testpass123",
    UserFlags { is_active: false, is_staff: false, is_superuser: false },
    false
)]
#[tokio::test]
async fn token_issued_only_for_valid_active_credentials(
    plain_hasher: MockPasswordHasher,
    #[case] password: &str,
    #[case] flags: UserFlags,
    #[case] should_succeed: bool,
) {
    let mut users = MockUserRepository::new();
    users.expect_find_credentials().returning(move |email| {
        Ok(Some(StoredCredentials {
            user: user_with(9, email.as_ref(), flags),
            password_hash: "hashed:testpass123".to_owned(),
        }))
    });
    let mut tokens = MockAuthTokenRepository::new();
    tokens
        .expect_replace_for_user()
        .with(eq(UserId::new(9)), mockall::predicate::always())
        .times(usize::from(should_succeed))
        .returning(|_, _| Ok(()));
    let service = make_service(users, tokens, plain_hasher);
    let creds = LoginCredentials::try_from_parts("test@example.com", password).expect("shape");

    match service.issue_token(&creds).await {
        Ok(token) => {
            assert!(should_succeed);
            assert_eq!(token.expose().len(), 40);
        }
        Err(err) => {
            assert!(!should_succeed);
            assert_eq!(err.code(), ErrorCode::InvalidRequest);
            assert_eq!(err.message(), BAD_CREDENTIALS);
        }
    }
}

#[rstest]
#[tokio::test]
async fn unknown_email_fails_like_a_wrong_password(plain_hasher: MockPasswordHasher) {
    let mut users = MockUserRepository::new();
    users.expect_find_credentials().returning(|_| Ok(None));
    let service = make_service(users, MockAuthTokenRepository::new(), plain_hasher);
    let creds = LoginCredentials::try_from_parts("nobody@example.com", "whatever").expect("shape");

    let err = service.authenticate(&creds).await.expect_err("unknown user");
    assert_eq!(err.message(), BAD_CREDENTIALS);
}

#[rstest]
#[tokio::test]
async fn resolve_token_looks_up_by_digest(plain_hasher: MockPasswordHasher) {
    let token = AuthToken::generate();
    let digest = token.digest();
    let mut tokens = MockAuthTokenRepository::new();
    tokens
        .expect_find_user_by_digest()
        .with(eq(digest))
        .returning(|_| Ok(Some(user_with(3, "owner@example.com", UserFlags::REGULAR))));
    let service = make_service(MockUserRepository::new(), tokens, plain_hasher);

    let user = service.resolve_token(&token).await.expect("token resolves");
    assert_eq!(user.id(), UserId::new(3));
}

#[rstest]
#[case(None)]
#[case(Some(UserFlags { is_active: false, is_staff: true, is_superuser: true }))]
#[tokio::test]
async fn unknown_or_inactive_tokens_are_unauthorized(
    plain_hasher: MockPasswordHasher,
    #[case] owner_flags: Option<UserFlags>,
) {
    let mut tokens = MockAuthTokenRepository::new();
    tokens
        .expect_find_user_by_digest()
        .returning(move |_| Ok(owner_flags.map(|flags| user_with(4, "x@example.com", flags))));
    let service = make_service(MockUserRepository::new(), tokens, plain_hasher);

    let err = service
        .resolve_token(&AuthToken::generate())
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn profile_update_rehashes_password(plain_hasher: MockPasswordHasher) {
    let mut users = MockUserRepository::new();
    users
        .expect_update()
        .withf(|id, changes| {
            *id == UserId::new(2)
                && changes.password_hash.as_deref() == Some("hashed:newpassword")
                && changes.name.as_ref().map(|name| name.as_ref()) == Some("New Name")
                && changes.email.is_none()
        })
        .returning(|id, _| Ok(Some(user_with(id.get(), "me@example.com", UserFlags::REGULAR))));
    let service = make_service(users, MockAuthTokenRepository::new(), plain_hasher);
    let update = ProfileUpdate {
        email: None,
        name: Some(UserName::new("New Name").expect("valid")),
        password: Some(Password::new("newpassword").expect("valid")),
    };

    let user = service.update_profile(UserId::new(2), update).await.expect("updated");
    assert_eq!(user.id(), UserId::new(2));
}

#[rstest]
#[tokio::test]
async fn empty_profile_update_reads_current_profile(plain_hasher: MockPasswordHasher) {
    let mut users = MockUserRepository::new();
    users.expect_update().never();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(user_with(id.get(), "me@example.com", UserFlags::REGULAR))));
    let service = make_service(users, MockAuthTokenRepository::new(), plain_hasher);

    let user = service
        .update_profile(UserId::new(5), ProfileUpdate::default())
        .await
        .expect("profile");
    assert_eq!(user.email().as_ref(), "me@example.com");
}
