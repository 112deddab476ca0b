use diesel::{dsl, ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbAsyncPool};
use crate::models::user::{NewUser, User};

use crate::schema::users as user_fields;
use crate::schema::users::dsl::users;

pub struct Dao {
    db_async_pool: DbAsyncPool,
}

impl Dao {
    pub fn new(db_async_pool: &DbAsyncPool) -> Self {
        Self {
            db_async_pool: db_async_pool.clone(),
        }
    }

    /// Registers a new user. Username and email uniqueness is checked inside
    /// the insert transaction so the error can name the duplicated field; the
    /// unique constraints on the table remain the backstop for races.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        city: &str,
        zip_code: &str,
        street: &str,
        house_number: &str,
        mobile: &str,
    ) -> Result<User, DaoError> {
        let email_lowercase = email.to_lowercase();

        let new_user = NewUser {
            id: Uuid::now_v7(),
            username,
            email: &email_lowercase,
            password_hash,

            city,
            zip_code,
            street,
            house_number,
            mobile,

            created_timestamp: SystemTime::now(),
        };

        let mut db_connection = self.db_async_pool.get().await?;

        db_connection
            .build_transaction()
            .run::<_, DaoError, _>(|conn| {
                Box::pin(async move {
                    let username_taken = dsl::select(dsl::exists(
                        users.filter(user_fields::username.eq(new_user.username)),
                    ))
                    .get_result::<bool>(conn)
                    .await?;

                    if username_taken {
                        return Err(DaoError::AlreadyExists("username"));
                    }

                    let email_taken = dsl::select(dsl::exists(
                        users.filter(user_fields::email.eq(new_user.email)),
                    ))
                    .get_result::<bool>(conn)
                    .await?;

                    if email_taken {
                        return Err(DaoError::AlreadyExists("email"));
                    }

                    Ok(dsl::insert_into(users)
                        .values(&new_user)
                        .get_result::<User>(conn)
                        .await?)
                })
            })
            .await
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(users.find(user_id).first::<User>(&mut conn).await?)
    }

    pub async fn get_user_by_email(&self, user_email: &str) -> Result<User, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(users
            .filter(user_fields::email.eq(user_email.to_lowercase()))
            .first::<User>(&mut conn)
            .await?)
    }

    pub async fn get_user_by_username(&self, user_username: &str) -> Result<User, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(users
            .filter(user_fields::username.eq(user_username))
            .first::<User>(&mut conn)
            .await?)
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(users
            .order(user_fields::username.asc())
            .load::<User>(&mut conn)
            .await?)
    }

    pub async fn update_password(
        &self,
        user_id: Uuid,
        new_password_hash: &str,
    ) -> Result<(), DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        dsl::update(users.find(user_id))
            .set(user_fields::password_hash.eq(new_password_hash))
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
