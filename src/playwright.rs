//! Playwright bridge.
//!
//! Browser automation runs in a Node.js sidecar speaking newline-delimited
//! JSON over stdio. The script is written to the app data directory at
//! launch and spawned with `node`; it keeps a table of lazily built locators
//! keyed by numeric handle, which is what `PlaywrightNode` wraps.

use std::cell::RefCell;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::rc::Rc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::driver::{Node, Page};
use crate::error::{GrevError, Result};

const DRIVER_SCRIPT: &str = r#"'use strict';
const readline = require('readline');
const { chromium } = require('playwright');

let browser = null;
let page = null;
let nextId = 1;
const locators = new Map();

function resolve(parent, selector) {
  const scope = parent == null ? page : locators.get(parent).first();
  return scope.locator('xpath=' + selector);
}

async function handle(cmd) {
  switch (cmd.cmd) {
    case 'launch':
      browser = await chromium.launch({ headless: cmd.headless });
      page = await browser.newPage();
      return {};
    case 'goto':
      await page.goto(cmd.url, { timeout: 60000 });
      return {};
    case 'fill':
      await page.locator('xpath=' + cmd.selector).first().fill(cmd.text);
      return {};
    case 'press':
      await page.keyboard.press(cmd.key);
      return {};
    case 'scroll':
      await page.mouse.wheel(cmd.dx, cmd.dy);
      return {};
    case 'viewport':
      await page.setViewportSize({ width: cmd.width, height: cmd.height });
      return {};
    case 'evaluate':
      return { value: await page.evaluate(cmd.script) };
    case 'locate': {
      const id = nextId++;
      locators.set(id, resolve(cmd.parent, cmd.selector));
      return { id };
    }
    case 'locate_all': {
      const elements = await locators.get(cmd.parent).locator('xpath=' + cmd.selector).all();
      const ids = elements.map((el) => {
        const id = nextId++;
        locators.set(id, el);
        return id;
      });
      return { ids };
    }
    case 'is_visible':
      try {
        await locators.get(cmd.id).first().waitFor({ state: 'visible', timeout: cmd.timeout_ms });
        return { ok: true };
      } catch (e) {
        return { ok: false };
      }
    case 'is_attached':
      try {
        await locators.get(cmd.id).first().waitFor({ state: 'attached', timeout: cmd.timeout_ms });
        return { ok: true };
      } catch (e) {
        return { ok: false };
      }
    case 'text':
      return { value: await locators.get(cmd.id).first().innerText() };
    case 'all_texts':
      return { value: await locators.get(cmd.id).allInnerTexts() };
    case 'attribute':
      return { value: await locators.get(cmd.id).first().getAttribute(cmd.name) };
    case 'click':
      await locators.get(cmd.id).first().click({ timeout: cmd.timeout_ms });
      return {};
    case 'close':
      if (browser) await browser.close();
      return { done: true };
    default:
      throw new Error('unknown command: ' + cmd.cmd);
  }
}

const rl = readline.createInterface({ input: process.stdin });
let queue = Promise.resolve();
rl.on('line', (line) => {
  queue = queue.then(async () => {
    let reply;
    try {
      reply = await handle(JSON.parse(line));
    } catch (e) {
      reply = { error: String(e && e.message ? e.message : e) };
    }
    process.stdout.write(JSON.stringify(reply) + '\n');
    if (reply.done) process.exit(0);
  });
});
"#;

/// One request/response exchange with the sidecar.
struct Bridge {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Bridge {
    fn send(&mut self, command: Value) -> Result<Value> {
        let line = serde_json::to_string(&command)?;
        debug!(command = %line, "driver command");
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;

        let mut reply = String::new();
        let read = self.stdout.read_line(&mut reply)?;
        if read == 0 {
            return Err(GrevError::Driver("driver process exited".to_string()));
        }
        let reply: Value = serde_json::from_str(&reply)?;
        if let Some(error) = reply.get("error").and_then(Value::as_str) {
            return Err(GrevError::Driver(error.to_string()));
        }
        Ok(reply)
    }
}

/// A live browser tab behind the sidecar.
pub struct PlaywrightPage {
    bridge: Rc<RefCell<Bridge>>,
}

impl PlaywrightPage {
    /// Write the driver script, spawn the sidecar and launch a browser.
    pub fn launch(headless: bool) -> Result<Self> {
        let data_dir = Config::data_dir()?;
        let script_path = data_dir.join("driver.js");
        fs::write(&script_path, DRIVER_SCRIPT)?;

        let mut child = Command::new("node")
            .arg(&script_path)
            .current_dir(&data_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| GrevError::Driver(format!("failed to start node: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GrevError::Driver("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GrevError::Driver("driver stdout unavailable".to_string()))?;

        let mut bridge = Bridge {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };
        bridge.send(json!({"cmd": "launch", "headless": headless}))?;

        Ok(Self {
            bridge: Rc::new(RefCell::new(bridge)),
        })
    }

    pub fn close(&self) -> Result<()> {
        self.bridge.borrow_mut().send(json!({"cmd": "close"}))?;
        Ok(())
    }
}

impl Drop for PlaywrightPage {
    fn drop(&mut self) {
        let _ = self.bridge.borrow_mut().child.kill();
    }
}

impl Page for PlaywrightPage {
    fn goto(&self, url: &str) -> Result<()> {
        self.bridge
            .borrow_mut()
            .send(json!({"cmd": "goto", "url": url}))?;
        Ok(())
    }

    fn locate(&self, selector: &str) -> Result<Box<dyn Node>> {
        let reply = self
            .bridge
            .borrow_mut()
            .send(json!({"cmd": "locate", "parent": null, "selector": selector}))?;
        node_from_reply(&self.bridge, &reply)
    }

    fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.bridge
            .borrow_mut()
            .send(json!({"cmd": "fill", "selector": selector, "text": text}))?;
        Ok(())
    }

    fn press(&self, key: &str) -> Result<()> {
        self.bridge
            .borrow_mut()
            .send(json!({"cmd": "press", "key": key}))?;
        Ok(())
    }

    fn scroll_by(&self, dx: i64, dy: i64) -> Result<()> {
        self.bridge
            .borrow_mut()
            .send(json!({"cmd": "scroll", "dx": dx, "dy": dy}))?;
        Ok(())
    }

    fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        self.bridge
            .borrow_mut()
            .send(json!({"cmd": "viewport", "width": width, "height": height}))?;
        Ok(())
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let reply = self
            .bridge
            .borrow_mut()
            .send(json!({"cmd": "evaluate", "script": script}))?;
        Ok(reply.get("value").cloned().unwrap_or(Value::Null))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A locator handle inside the sidecar's table.
struct PlaywrightNode {
    bridge: Rc<RefCell<Bridge>>,
    id: u64,
}

fn node_from_reply(bridge: &Rc<RefCell<Bridge>>, reply: &Value) -> Result<Box<dyn Node>> {
    let id = reply
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| GrevError::Driver("driver reply missing locator id".to_string()))?;
    Ok(Box::new(PlaywrightNode {
        bridge: Rc::clone(bridge),
        id,
    }))
}

impl PlaywrightNode {
    fn probe(&self, cmd: &str, timeout: Duration) -> bool {
        let reply = self.bridge.borrow_mut().send(json!({
            "cmd": cmd,
            "id": self.id,
            "timeout_ms": timeout.as_millis() as u64,
        }));
        match reply {
            Ok(reply) => reply.get("ok").and_then(Value::as_bool).unwrap_or(false),
            Err(_) => false,
        }
    }
}

impl Node for PlaywrightNode {
    fn locate(&self, selector: &str) -> Result<Box<dyn Node>> {
        let reply = self
            .bridge
            .borrow_mut()
            .send(json!({"cmd": "locate", "parent": self.id, "selector": selector}))?;
        node_from_reply(&self.bridge, &reply)
    }

    fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn Node>>> {
        let reply = self
            .bridge
            .borrow_mut()
            .send(json!({"cmd": "locate_all", "parent": self.id, "selector": selector}))?;
        let ids = reply
            .get("ids")
            .and_then(Value::as_array)
            .ok_or_else(|| GrevError::Driver("driver reply missing locator ids".to_string()))?;
        let mut nodes: Vec<Box<dyn Node>> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id
                .as_u64()
                .ok_or_else(|| GrevError::Driver("non-numeric locator id".to_string()))?;
            nodes.push(Box::new(PlaywrightNode {
                bridge: Rc::clone(&self.bridge),
                id,
            }));
        }
        Ok(nodes)
    }

    fn is_visible(&self, timeout: Duration) -> bool {
        self.probe("is_visible", timeout)
    }

    fn is_attached(&self, timeout: Duration) -> bool {
        self.probe("is_attached", timeout)
    }

    fn text(&self) -> Result<String> {
        let reply = self
            .bridge
            .borrow_mut()
            .send(json!({"cmd": "text", "id": self.id}))?;
        Ok(reply
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    fn all_texts(&self) -> Result<Vec<String>> {
        let reply = self
            .bridge
            .borrow_mut()
            .send(json!({"cmd": "all_texts", "id": self.id}))?;
        let texts = reply
            .get("value")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(texts)
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        let reply = self
            .bridge
            .borrow_mut()
            .send(json!({"cmd": "attribute", "id": self.id, "name": name}))?;
        Ok(reply
            .get("value")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn click(&self, timeout: Duration) -> Result<()> {
        self.bridge.borrow_mut().send(json!({
            "cmd": "click",
            "id": self.id,
            "timeout_ms": timeout.as_millis() as u64,
        }))?;
        Ok(())
    }
}
