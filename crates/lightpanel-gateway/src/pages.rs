//! HTML pages served by the gateway.

const STYLE: &str = "body{font-family:sans-serif;background:#1a1a2e;color:#eee;margin:0}\
.card{background:#16213e;padding:40px;border-radius:12px;text-align:center;max-width:360px;width:100%}\
.center{display:flex;justify-content:center;align-items:center;height:100vh}\
input{width:100%;padding:10px;border:1px solid #333;border-radius:6px;background:#0f3460;\
color:#eee;font-size:0.95em;box-sizing:border-box}\
button{padding:10px 20px;border:none;border-radius:6px;cursor:pointer;font-size:0.95em;\
background:#e94560;color:#fff}\
.error{color:#e94560;margin:0 0 16px;font-size:0.9em}\
.container{max-width:600px;margin:0 auto;padding:20px}\
.row{display:flex;gap:8px;align-items:center;margin-bottom:8px}\
.row .icon{max-width:70px}\
label{display:block;color:#aaa;font-size:0.85em;margin:12px 0 4px}\
.secondary{background:#0f3460;color:#aaa;border:1px solid #333}\
.ok{color:#4caf50}.fail{color:#e94560}";

/// The login form, optionally with an error line.
#[must_use]
pub fn login(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Light Panel</title><style>{STYLE}</style></head>
<body><div class="center"><div class="card">
<h1>Light Panel</h1>
<p>Manage the light buttons shown on the panel.</p>
{error}
<form method="POST" action="/login">
<input type="password" name="password" placeholder="Password" autofocus>
<p><button type="submit">Unlock Settings</button></p>
</form></div></div></body></html>"#
    )
}

/// The settings editor. All data is loaded from `/api/config` by the script.
#[must_use]
pub fn settings() -> String {
    format!(
        r##"<!DOCTYPE html><html><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Settings - Light Panel</title><style>{STYLE}</style></head>
<body><div class="container">
<div class="row"><h1 style="flex:1">Settings</h1>
<button class="secondary" onclick="fetch('/logout',{{method:'POST'}}).then(()=>location.href='/')">Logout</button></div>
<label>Remote URL</label><input id="remote_url" placeholder="http://192.168.1.100:8123">
<label>Remote Token</label><input id="remote_token">
<p><button class="secondary" onclick="testConnection()">Test Connection</button> <span id="test"></span></p>
<label>Lights</label><div id="lights"></div>
<p><button class="secondary" onclick="addLight()">+ Add Light</button>
<button onclick="save()">Save &amp; Reload</button></p>
<div id="status"></div>
</div>
<script>
let cfg={{lights:[]}};
function esc(s){{return(s||"").replace(/&/g,"&amp;").replace(/"/g,"&quot;").replace(/</g,"&lt;")}}
function render(){{
  document.getElementById("lights").innerHTML=cfg.lights.map((l,i)=>
    '<div class="row"><input data-i="'+i+'" data-f="label" placeholder="Living Room" value="'+esc(l.label)+'">'
    +'<input data-i="'+i+'" data-f="entity_id" placeholder="light.living_room" value="'+esc(l.entity_id)+'">'
    +'<input class="icon" data-i="'+i+'" data-f="icon" placeholder="bulb" value="'+esc(l.icon)+'">'
    +'<button class="secondary" onclick="removeLight('+i+')">x</button></div>').join("");
}}
function gather(){{
  document.querySelectorAll("#lights input").forEach(inp=>{{cfg.lights[inp.dataset.i][inp.dataset.f]=inp.value}});
  cfg.remote_url=document.getElementById("remote_url").value;
  cfg.remote_token=document.getElementById("remote_token").value;
  cfg.lights=cfg.lights.filter(l=>l.entity_id);
  return cfg;
}}
function addLight(){{gather();cfg.lights.push({{entity_id:"",label:"",icon:"bulb"}});render()}}
function removeLight(i){{gather();cfg.lights.splice(i,1);render()}}
function testConnection(){{
  const el=document.getElementById("test");el.className="";el.textContent="Testing...";
  fetch("/api/test-connection",{{method:"POST",headers:{{"Content-Type":"application/json"}},
    body:JSON.stringify({{remote_url:document.getElementById("remote_url").value,
      remote_token:document.getElementById("remote_token").value}})}})
  .then(r=>r.json()).then(d=>{{el.className=d.ok?"ok":"fail";el.textContent=d.message}})
  .catch(e=>{{el.className="fail";el.textContent="Request failed: "+e.message}});
}}
function save(){{
  const st=document.getElementById("status");st.textContent="Saving...";
  fetch("/api/config",{{method:"POST",headers:{{"Content-Type":"application/json"}},body:JSON.stringify(gather())}})
  .then(r=>r.json().then(d=>{{if(!r.ok)throw new Error(d.error?d.error.message:r.statusText);return d}}))
  .then(()=>{{st.textContent="Saved and reloaded!"}})
  .catch(e=>{{st.textContent="Error: "+e.message}});
}}
fetch("/api/config").then(r=>r.json()).then(d=>{{
  cfg=d;cfg.lights=cfg.lights||[];
  document.getElementById("remote_url").value=d.remote_url||"";
  document.getElementById("remote_token").value=d.remote_token||"";
  render();
}}).catch(()=>location.href="/");
</script></body></html>"##
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_shows_escaped_error() {
        let page = login(Some("<bad>"));
        assert!(page.contains("&lt;bad&gt;"));
        assert!(page.contains(r#"action="/login""#));
        assert!(!login(None).contains(r#"class="error""#));
    }

    #[test]
    fn settings_uses_api() {
        let page = settings();
        assert!(page.contains("/api/config"));
        assert!(page.contains("/api/test-connection"));
        assert!(!page.contains("web_password_hash"));
    }
}
