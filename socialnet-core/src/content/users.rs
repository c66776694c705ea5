use crate::api::{
    AuthenticateStatus, AuthenticateUserRequest, AuthenticateUserResponse, CreateUserRequest,
    CreateUserResponse, CreateUserStatus, EditUserRequest, EditUserStatus, ServiceError,
};
use crate::model::{NewUser, User};
use crate::storage::{SocialStore, UserInsert};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Registration, login and profile edits
pub struct UserManager {
    store: Arc<dyn SocialStore>,
}

impl UserManager {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    pub fn create_user(&self, req: CreateUserRequest) -> Result<CreateUserResponse, ServiceError> {
        let (hashed_password, salt) = hash_password(&req.password)?;

        let new_user = NewUser {
            hashed_password,
            salt,
            first_name: req.first_name,
            last_name: req.last_name,
            date_of_birth: req.date_of_birth,
            email: req.email,
            username: req.username,
        };

        match self.store.insert_user(&new_user)? {
            UserInsert::Created(user) => {
                info!(user_id = %user.id, username = %user.username, "user created");
                Ok(CreateUserResponse {
                    status: CreateUserStatus::Ok,
                    user: Some(user.summary()),
                })
            }
            UserInsert::UsernameTaken => {
                debug!(username = %new_user.username, "create user: username taken");
                Ok(CreateUserResponse {
                    status: CreateUserStatus::UsernameTaken,
                    user: None,
                })
            }
        }
    }

    /// Apply the fields present in `req`; a new password gets a new salt
    pub fn edit_user(&self, req: EditUserRequest) -> Result<EditUserStatus, ServiceError> {
        let Some(mut user) = self.store.get_user(req.user_id)? else {
            debug!(user_id = %req.user_id, "edit user: user not found");
            return Ok(EditUserStatus::UserNotFound);
        };

        if let Some(first_name) = req.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            user.last_name = last_name;
        }
        if let Some(date_of_birth) = req.date_of_birth {
            user.date_of_birth = date_of_birth;
        }
        if let Some(password) = req.password {
            let (hashed_password, salt) = hash_password(&password)?;
            user.hashed_password = hashed_password;
            user.salt = salt;
        }

        self.store.update_user(&user)?;
        info!(user_id = %user.id, "user profile updated");

        Ok(EditUserStatus::Ok)
    }

    pub fn authenticate_user(
        &self,
        req: AuthenticateUserRequest,
    ) -> Result<AuthenticateUserResponse, ServiceError> {
        let Some(user) = self.store.find_user_by_username(&req.username)? else {
            debug!(username = %req.username, "authenticate: user not found");
            return Ok(AuthenticateUserResponse {
                status: AuthenticateStatus::UserNotFound,
                user_id: None,
            });
        };

        if !verify_password(&user, &req.password)? {
            debug!(user_id = %user.id, "authenticate: wrong password");
            return Ok(AuthenticateUserResponse {
                status: AuthenticateStatus::WrongPassword,
                user_id: None,
            });
        }

        Ok(AuthenticateUserResponse {
            status: AuthenticateStatus::Ok,
            user_id: Some(user.id),
        })
    }
}

/// Hash with a fresh salt; returns the PHC digest string and the salt
fn hash_password(password: &str) -> Result<(String, String), ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok((digest, salt.as_str().to_string()))
}

fn verify_password(user: &User, password: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(&user.hashed_password)
        .map_err(|e| ServiceError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
