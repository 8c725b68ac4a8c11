//! In-process Zabbix JSON-RPC stub used by tests.
//!
//! Serves enough of the host/hostgroup/template/image/map surface to drive
//! the coordinator and the map synchronizer against a real HTTP round trip.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct FakeHost {
    pub id: String,
    pub name: String,
    pub group_id: String,
}

#[derive(Default)]
pub struct FakeZabbix {
    pub groups: Mutex<HashMap<String, String>>,
    pub hosts: Mutex<Vec<FakeHost>>,
    pub maps: Mutex<HashMap<String, String>>,
    pub templates: Mutex<HashMap<String, String>>,
    pub map_creates: Mutex<u32>,
    /// Every selements batch pushed via map.update, in call order.
    pub element_batches: Mutex<Vec<Vec<Value>>>,
    counter: Mutex<u64>,
}

impl FakeZabbix {
    fn next_id(&self) -> String {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        counter.to_string()
    }

    fn dispatch(&self, method: &str, params: &Value) -> Value {
        match method {
            "user.login" => json!("fake-token"),
            "apiinfo.version" => json!("7.0.0"),
            "hostgroup.get" => {
                let name = params["filter"]["name"].as_str().unwrap_or_default();
                match self.groups.lock().unwrap().get(name) {
                    Some(id) => json!([{ "groupid": id, "name": name }]),
                    None => json!([]),
                }
            }
            "hostgroup.create" => {
                let name = params["name"].as_str().unwrap_or_default().to_string();
                let id = self.next_id();
                self.groups.lock().unwrap().insert(name, id.clone());
                json!({ "groupids": [id] })
            }
            "host.get" => {
                let hosts = self.hosts.lock().unwrap();
                let matched: Vec<&FakeHost> = if let Some(name) = params["filter"]["host"].as_str()
                {
                    hosts.iter().filter(|h| h.name == name).collect()
                } else if let Some(group_ids) = params["groupids"].as_array() {
                    hosts
                        .iter()
                        .filter(|h| group_ids.iter().any(|g| g == h.group_id.as_str()))
                        .collect()
                } else {
                    hosts.iter().collect()
                };
                Value::Array(
                    matched
                        .into_iter()
                        .map(|h| json!({ "hostid": h.id, "host": h.name }))
                        .collect(),
                )
            }
            "host.create" => {
                let id = self.next_id();
                self.hosts.lock().unwrap().push(FakeHost {
                    id: id.clone(),
                    name: params["host"].as_str().unwrap_or_default().to_string(),
                    group_id: params["groups"][0]["groupid"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                });
                json!({ "hostids": [id] })
            }
            "host.update" => json!({ "hostids": [params["hostid"]] }),
            "host.delete" => {
                let ids: Vec<String> = params
                    .as_array()
                    .map(|a| {
                        a.iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                self.hosts
                    .lock()
                    .unwrap()
                    .retain(|h| !ids.contains(&h.id));
                json!({ "hostids": ids })
            }
            "template.get" => {
                let name = params["filter"]["name"].as_str().unwrap_or_default();
                match self.templates.lock().unwrap().get(name) {
                    Some(id) => json!([{ "templateid": id }]),
                    None => json!([]),
                }
            }
            "image.get" => json!([{ "imageid": "42" }]),
            "map.get" => {
                let name = params["filter"]["name"].as_str().unwrap_or_default();
                match self.maps.lock().unwrap().get(name) {
                    Some(id) => json!([{ "sysmapid": id }]),
                    None => json!([]),
                }
            }
            "map.create" => {
                let name = params["name"].as_str().unwrap_or_default().to_string();
                let id = self.next_id();
                self.maps.lock().unwrap().insert(name, id.clone());
                *self.map_creates.lock().unwrap() += 1;
                json!({ "sysmapids": [id] })
            }
            "map.update" => {
                let batch = params["selements"].as_array().cloned().unwrap_or_default();
                self.element_batches.lock().unwrap().push(batch);
                json!({ "sysmapids": [params["sysmapid"]] })
            }
            _ => Value::Null,
        }
    }
}

async fn rpc(State(fake): State<Arc<FakeZabbix>>, Json(body): Json<Value>) -> Json<Value> {
    let method = body["method"].as_str().unwrap_or_default().to_string();
    let result = fake.dispatch(&method, &body["params"]);
    Json(json!({ "jsonrpc": "2.0", "result": result, "id": body["id"] }))
}

/// Binds the stub on an ephemeral port and returns its base URL.
pub async fn spawn() -> (String, Arc<FakeZabbix>) {
    let fake = Arc::new(FakeZabbix::default());
    let app = Router::new()
        .route("/api_jsonrpc.php", post(rpc))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), fake)
}
