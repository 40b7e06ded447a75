//! User API example: one resource over an in-memory store
//!
//! Run with `cargo run --example user_api` and browse http://127.0.0.1:3000/Users,
//! or pass a directory (`cargo run --example user_api -- ./java`) to write the
//! generated Java client there instead of serving.
//!
//! Set `RESTBIND_CONFIG` to a YAML file to override the server configuration.

use restbind::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct User {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "PasswordHash")]
    password_hash: String,
}

impl_describe!(User {
    "Id": String,
    "Name": String [POST, PUT],
    "Email": String [POST, PUT],
    "PasswordHash": String [POST] | hidden,
});

impl Itemer for User {
    fn item(&self, r: &Request) -> Item {
        Item::new(self)
            .set_name(self.name.clone())
            .add_link(r.new_link(Resource::<User>::link("self", Method::Load, &[("id", self.id.as_str())])))
            .add_link(r.new_link(Resource::<User>::link("update", Method::Update, &[("id", self.id.as_str())])))
            .add_link(r.new_link(Resource::<User>::link("delete", Method::Delete, &[("id", self.id.as_str())])))
    }
}

fn user_key(r: &Request) -> Key {
    Key::new("User", r.var("id").unwrap_or_default())
}

fn users(store: InMemoryStore<User>) -> Resource<User> {
    let (load_store, create_store, update_store, delete_store, list_store) = (
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    );

    Resource::<User>::new()
        .load(move |_w: ResponseWriter, r: Request| {
            let store = load_store.clone();
            async move {
                let user = store.get(&user_key(&r)).await?;
                Ok::<_, HandlerError>(Some(user))
            }
        })
        .create(move |w: ResponseWriter, r: Request| {
            let store = create_store.clone();
            async move {
                let mut user: User = r.copy()?;
                let key = Key::generate("User");
                user.id = key.id().to_string();
                store.put(key, user.clone()).await?;
                w.set_status(StatusCode::CREATED);
                Ok::<_, HandlerError>(Some(user))
            }
        })
        .update(move |_w: ResponseWriter, r: Request| {
            let store = update_store.clone();
            async move {
                let key = user_key(&r);
                let current = store.get(&key).await?;
                let changes: User = r.copy()?;
                let user = User {
                    name: changes.name,
                    email: changes.email,
                    ..current
                };
                store.put(key, user.clone()).await?;
                Ok::<_, HandlerError>(Some(user))
            }
        })
        .delete(move |w: ResponseWriter, r: Request| {
            let store = delete_store.clone();
            async move {
                store.delete(&user_key(&r)).await?;
                w.set_status(StatusCode::NO_CONTENT);
                Ok::<Option<User>, HandlerError>(None)
            }
        })
        .lister(
            Lister::new("Users.List", "/Users", move |w: ResponseWriter, r: Request| {
                let store = list_store.clone();
                async move {
                    let wanted = r.query("name");
                    let items = store
                        .list()
                        .await?
                        .into_iter()
                        .map(|(_, user)| user)
                        .filter(|user| wanted.as_ref().is_none_or(|name| &user.name == name))
                        .map(|user| user.item(&r))
                        .collect();
                    let create = r.new_link(Resource::<User>::link("create", Method::Create, &[]));
                    w.set_content(Item::list(items).set_name("Users").add_link(create));
                    Ok::<_, HandlerError>(())
                }
            })
            .query_param("name"),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::var("RESTBIND_CONFIG") {
        Ok(path) => ServerConfig::from_yaml_file(&path)?,
        Err(_) => ServerConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let builder = ServerBuilder::new()
        .with_config(config)
        .register_resource(users(InMemoryStore::new()))?;

    if let Some(dir) = std::env::args().nth(1) {
        let classes = builder.build_host().generate_java()?;
        write_to_dir(&dir, &classes)?;
        return Ok(());
    }

    builder.serve("127.0.0.1:3000").await
}
