//! Scene graph: a tree of named nodes carrying typed components.
//!
//! Nodes are addressed by `/`-separated paths relative to the root (`""` is the
//! root itself, `"beam/ball"` a grandchild). A component is addressed by its
//! node path followed by its own name, e.g. `"beam/ball/only_ball"`.

pub mod component;
pub mod demo;
pub mod property;

use crate::camera::OffscreenCamera;
use crate::error::{CaptureError, Result};
use crate::name::{FindByName, HasName};
use crate::UID;

pub use component::{
    BoxRegion, Component, ElasticMaterial, FixedBox, LinearForceField, RegularGrid, VisualModel,
};
pub use property::{with_array_mut, HasProperties, PropertyValue, WriteableArray};

/// Index of a node inside its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Node {
    uid: UID,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    components: Vec<Component>,
}

impl Node {
    pub fn uid(&self) -> &UID {
        &self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

impl HasName for Node {
    fn get_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    /// Default time step of the scene in seconds.
    pub dt: f64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = Node {
            uid: UID::new(),
            name: "root".to_string(),
            parent: None,
            children: vec![],
            components: vec![],
        };
        Self {
            nodes: vec![root],
            dt: 0.01,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| CaptureError::scene(format!("no node with index {}", id.0)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        if name.is_empty() || name.contains('/') {
            return Err(CaptureError::scene(format!("invalid node name '{name}'")));
        }
        let siblings = &self.node(parent)?.children;
        if siblings.iter().any(|c| self.nodes[c.0].name == name) {
            return Err(CaptureError::scene(format!(
                "node '{}' already has a child named '{name}'",
                self.node_path(parent)
            )));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            uid: UID::new(),
            name: name.to_string(),
            parent: Some(parent),
            children: vec![],
            components: vec![],
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Validates and attaches a component. Names are unique within a node.
    pub fn add_component(&mut self, node: NodeId, component: impl Into<Component>) -> Result<()> {
        let component = component.into();
        component.validate()?;
        let path = self.node_path(node);
        let target = self
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| CaptureError::scene(format!("no node with index {}", node.0)))?;
        if target.components.contains_name(component.get_name()) {
            return Err(CaptureError::scene(format!(
                "node '{path}' already has a component named '{}'",
                component.get_name()
            )));
        }
        target.components.push(component);
        Ok(())
    }

    pub fn find_node(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = *self.nodes[current.0]
                .children
                .iter()
                .find(|c| self.nodes[c.0].name == part)?;
        }
        Some(current)
    }

    /// Path of `id` relative to the root.
    pub fn node_path(&self, id: NodeId) -> String {
        let mut parts = vec![];
        let mut current = Some(id);
        while let Some(n) = current.and_then(|c| self.nodes.get(c.0)) {
            if n.parent.is_some() {
                parts.push(n.name.as_str());
            }
            current = n.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Splits a component path into the owning node and the component index.
    fn locate(&self, path: &str) -> Result<(NodeId, usize)> {
        let (node_path, name) = path.rsplit_once('/').unwrap_or(("", path));
        let node = self
            .find_node(node_path)
            .ok_or_else(|| CaptureError::scene(format!("no node at '{node_path}'")))?;
        let idx = self.nodes[node.0]
            .components
            .position_by_name(name)
            .ok_or_else(|| CaptureError::scene(format!("no component at '{path}'")))?;
        Ok((node, idx))
    }

    pub fn component(&self, path: &str) -> Result<&Component> {
        let (node, idx) = self.locate(path)?;
        Ok(&self.nodes[node.0].components[idx])
    }

    pub fn component_mut(&mut self, path: &str) -> Result<&mut Component> {
        let (node, idx) = self.locate(path)?;
        Ok(&mut self.nodes[node.0].components[idx])
    }

    /// Node that owns the component at `path`.
    pub fn owner_of(&self, path: &str) -> Result<NodeId> {
        self.locate(path).map(|(node, _)| node)
    }

    pub fn camera(&self, path: &str) -> Result<&OffscreenCamera> {
        match self.component(path)? {
            Component::Camera(c) => Ok(c),
            other => Err(not_a(path, "OffscreenCamera", other)),
        }
    }

    pub fn camera_mut(&mut self, path: &str) -> Result<&mut OffscreenCamera> {
        match self.component_mut(path)? {
            Component::Camera(c) => Ok(c),
            other => Err(not_a(path, "OffscreenCamera", other)),
        }
    }

    pub fn force_field_mut(&mut self, path: &str) -> Result<&mut LinearForceField> {
        match self.component_mut(path)? {
            Component::ForceField(c) => Ok(c),
            other => Err(not_a(path, "LinearForceField", other)),
        }
    }

    /// All components in depth-first order, with their owning node.
    pub fn components(&self) -> impl Iterator<Item = (NodeId, &Component)> {
        self.subtree(self.root()).into_iter().flat_map(move |id| {
            self.nodes[id.0]
                .components
                .iter()
                .map(move |c| (id, c))
        })
    }

    pub fn components_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Component)> {
        self.nodes
            .iter_mut()
            .enumerate()
            .flat_map(|(i, n)| n.components.iter_mut().map(move |c| (NodeId(i), c)))
    }

    /// Component paths of every camera in the scene.
    pub fn camera_paths(&self) -> Vec<String> {
        self.components()
            .filter(|(_, c)| matches!(c, Component::Camera(_)))
            .map(|(id, c)| join_path(&self.node_path(id), c.get_name()))
            .collect()
    }

    /// `id` and all its descendants, depth-first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.nodes.get(n.0) else {
                continue;
            };
            out.push(n);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn validate(&self) -> Result<()> {
        for (id, c) in self.components() {
            c.validate().map_err(|e| {
                CaptureError::scene(format!("in node '{}': {e}", self.node_path(id)))
            })?;
        }
        if !(self.dt.is_finite() && self.dt > 0.) {
            return Err(CaptureError::scene(format!(
                "scene time step must be positive, got {}",
                self.dt
            )));
        }
        Ok(())
    }
}

pub(crate) fn join_path(node_path: &str, name: &str) -> String {
    if node_path.is_empty() {
        name.to_string()
    } else {
        format!("{node_path}/{name}")
    }
}

fn not_a(path: &str, expected: &str, got: &Component) -> CaptureError {
    CaptureError::scene(format!(
        "component '{path}' is a {}, not a {expected}",
        got.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, Vector};

    fn small_scene() -> SceneGraph {
        let mut scene = SceneGraph::new();
        let beam = scene.add_child(scene.root(), "beam").unwrap();
        let ball = scene.add_child(beam, "ball").unwrap();
        scene
            .add_component(beam, OffscreenCamera::new("wide"))
            .unwrap();
        scene
            .add_component(ball, OffscreenCamera::new("narrow"))
            .unwrap();
        scene
            .add_component(
                beam,
                LinearForceField::new("traction", [0.; 6], vec![0.], vec![Vector::zero()]),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_paths() {
        let scene = small_scene();
        let ball = scene.find_node("beam/ball").unwrap();
        assert_eq!(scene.node_path(ball), "beam/ball");
        assert_eq!(scene.node_path(scene.root()), "");
        assert_eq!(scene.find_node(""), Some(scene.root()));
        assert!(scene.find_node("beam/nothing").is_none());
        assert_eq!(scene.owner_of("beam/ball/narrow").unwrap(), ball);
        assert_eq!(
            scene.camera_paths(),
            vec!["beam/wide".to_string(), "beam/ball/narrow".to_string()]
        );
    }

    #[test]
    fn test_typed_lookup() {
        let mut scene = small_scene();
        scene.camera_mut("beam/wide").unwrap().position = Point::new(1., 2., 3.);
        assert_eq!(scene.camera("beam/wide").unwrap().position, Point::new(1., 2., 3.));
        assert!(scene.camera("beam/traction").is_err());
        assert!(scene.force_field_mut("beam/traction").is_ok());
        assert!(scene.force_field_mut("beam/wide").is_err());
        assert!(scene.component("beam/ball/missing").is_err());
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut scene = small_scene();
        let beam = scene.find_node("beam").unwrap();
        assert!(scene.add_child(scene.root(), "beam").is_err());
        assert!(scene.add_child(beam, "a/b").is_err());
        assert!(scene.add_component(beam, OffscreenCamera::new("wide")).is_err());
        // Same name in another node is fine
        let ball = scene.find_node("beam/ball").unwrap();
        assert!(scene.add_component(ball, OffscreenCamera::new("wide")).is_ok());
    }

    #[test]
    fn test_invalid_component_rejected_on_add() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let bad = OffscreenCamera::new("cam").with_viewport(0, 10);
        assert!(matches!(
            scene.add_component(root, bad),
            Err(CaptureError::SceneBuild(_))
        ));
    }

    #[test]
    fn test_subtree() {
        let scene = small_scene();
        let beam = scene.find_node("beam").unwrap();
        let ball = scene.find_node("beam/ball").unwrap();
        assert_eq!(scene.subtree(beam), vec![beam, ball]);
        assert_eq!(scene.subtree(ball), vec![ball]);
        assert_eq!(scene.subtree(scene.root()).len(), 3);
    }
}
