//! # Choice List Engine
//!
//! An arena of normalized choices plus a *rotation* of handles that decides
//! what is on screen:
//!
//! ```text
//! arena:  [0 fruit] [1 apple] [2 pear] [3 veg] [4 kale] [5 leek]
//! order:  [2] [3] [4] [5] [0] [1]        ← current rotation
//!          └── window (limit = 3) ─┘
//! index:       1                         → focused = order[1] = choice 3
//! ```
//!
//! Scrolling never computes offsets. Moving past the bottom of the window
//! rotates the head of `order` to its tail (and vice versa), so the window is
//! always `order[..limit]`. Nested choices are flattened depth-first; the
//! tree lives in the `parent`/`children` handles.
//!
//! Every operation returns `true` when it changed something and `false` when
//! it was rejected (the caller rings the bell). Rejected operations leave the
//! list untouched.

use log::debug;

use crate::core::choice::{Choice, ChoiceConfig, ChoiceId, NormalizeContext};

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub multiple: bool,
    pub limit: Option<usize>,
    pub max_selected: Option<usize>,
    /// When false, up/down stop at the window edges instead of wrapping or scrolling.
    pub scroll: bool,
    /// shift+up/down swap neighbours instead of scrolling.
    pub sort: bool,
    /// Names or decimal indices enabled at construction (multi-select).
    pub preselect: Vec<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            multiple: false,
            limit: None,
            max_selected: None,
            scroll: true,
            sort: false,
            preselect: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChoiceList {
    arena: Vec<Choice>,
    order: Vec<ChoiceId>,
    index: usize,
    limit: Option<usize>,
    height: usize,
    multiple: bool,
    max_selected: usize,
    scroll: bool,
    sort: bool,
}

impl ChoiceList {
    pub fn new(configs: &[ChoiceConfig], options: &ListOptions) -> Self {
        let mut list = Self {
            arena: Vec::new(),
            order: Vec::new(),
            index: 0,
            limit: options.limit.filter(|l| *l > 0),
            height: usize::MAX,
            multiple: options.multiple,
            max_selected: options.max_selected.unwrap_or(usize::MAX),
            scroll: options.scroll,
            sort: options.sort,
        };
        for config in configs {
            list.add(config, None, 1, &options.preselect);
        }
        list.order = (0..list.arena.len()).map(ChoiceId).collect();
        list.settle_focus();
        debug!(
            "choice list: {} choices, limit {:?}, multiple {}",
            list.arena.len(),
            list.limit,
            list.multiple
        );
        list
    }

    fn add(
        &mut self,
        config: &ChoiceConfig,
        parent: Option<ChoiceId>,
        level: usize,
        preselect: &[String],
    ) -> ChoiceId {
        let id = ChoiceId(self.arena.len());
        let mut choice = Choice::pending(config);
        choice.normalize(NormalizeContext {
            index: id,
            parent,
            level,
            multiple: self.multiple,
            preselect,
        });
        self.arena.push(choice);
        for child in &config.choices {
            let child_id = self.add(child, Some(id), level + 1, preselect);
            self.arena[id.0].children.push(child_id);
        }
        id
    }

    /// Append a choice after construction. It is normalized on the way in and
    /// becomes focused, with the window widened to show every choice.
    pub fn append(&mut self, config: &ChoiceConfig) -> ChoiceId {
        let id = self.add(config, None, 1, &[]);
        let added: Vec<ChoiceId> = (id.0..self.arena.len()).map(ChoiceId).collect();
        self.order.extend(added);
        self.limit = Some(self.order.len());
        self.index = self.order.iter().position(|c| *c == id).unwrap_or(0);
        id
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn max_selected(&self) -> usize {
        self.max_selected
    }

    /// Every choice, in arena (original) order.
    pub fn choices(&self) -> &[Choice] {
        &self.arena
    }

    pub fn get(&self, id: ChoiceId) -> Option<&Choice> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: ChoiceId) -> Option<&mut Choice> {
        self.arena.get_mut(id.0)
    }

    /// Position of the focused choice within the window.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn focused_id(&self) -> Option<ChoiceId> {
        self.order.get(self.index).copied()
    }

    pub fn focused(&self) -> Option<&Choice> {
        self.focused_id().and_then(|id| self.get(id))
    }

    pub fn focused_mut(&mut self) -> Option<&mut Choice> {
        let id = self.focused_id()?;
        self.get_mut(id)
    }

    /// Effective window size: explicit limit, capped by terminal height and length.
    pub fn limit(&self) -> usize {
        let len = self.order.len();
        self.limit.unwrap_or(len).min(self.height).min(len).max(usize::from(len > 0))
    }

    pub fn set_height(&mut self, rows: usize) {
        self.height = rows.max(1);
        self.clamp_index();
    }

    pub fn visible_ids(&self) -> &[ChoiceId] {
        &self.order[..self.limit()]
    }

    pub fn visible(&self) -> impl Iterator<Item = &Choice> {
        self.visible_ids().iter().filter_map(|id| self.get(*id))
    }

    /// Selected leaves in original order. Groups are reported through their children.
    pub fn selected(&self) -> Vec<&Choice> {
        self.arena
            .iter()
            .filter(|c| !c.is_group() && !c.is_unselectable() && c.enabled)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected().len()
    }

    fn all_unselectable(&self) -> bool {
        self.order
            .iter()
            .all(|id| self.arena[id.0].is_unselectable())
    }

    fn focused_unselectable(&self) -> bool {
        self.focused().is_some_and(Choice::is_unselectable)
    }

    fn clamp_index(&mut self) {
        let limit = self.limit();
        if limit == 0 {
            self.index = 0;
        } else if self.index >= limit {
            self.index = limit - 1;
        }
    }

    fn sorted_order(&self) -> Vec<ChoiceId> {
        let mut order = self.order.clone();
        order.sort();
        order
    }

    // ========================================================================
    // Focus movement
    // ========================================================================

    fn step_up(&mut self) -> bool {
        let len = self.order.len();
        if len == 0 || (!self.scroll && self.index == 0) {
            return false;
        }
        if len > self.limit() && self.index == 0 {
            self.order.rotate_right(1);
        } else {
            self.index = (self.index + len - 1) % len;
        }
        true
    }

    fn step_down(&mut self) -> bool {
        let len = self.order.len();
        let vis = self.limit();
        if len == 0 || (!self.scroll && self.index + 1 >= vis) {
            return false;
        }
        if len > vis && self.index + 1 == vis {
            self.order.rotate_left(1);
        } else {
            self.index = (self.index + 1) % len;
        }
        true
    }

    /// Apply `step` once, then keep stepping past unselectable choices. If the
    /// walk can't land on a selectable choice, the list is restored.
    fn navigate(&mut self, step: fn(&mut Self) -> bool) -> bool {
        let saved = (self.order.clone(), self.index);
        if !step(self) {
            return false;
        }
        if self.skip_unselectable(step) {
            return true;
        }
        (self.order, self.index) = saved;
        false
    }

    fn skip_unselectable(&mut self, step: fn(&mut Self) -> bool) -> bool {
        if self.all_unselectable() {
            return true;
        }
        let mut guard = self.order.len() * 2;
        while self.focused_unselectable() && guard > 0 {
            guard -= 1;
            if !step(self) {
                break;
            }
        }
        !self.focused_unselectable()
    }

    /// Put initial focus on the first selectable choice.
    fn settle_focus(&mut self) {
        self.clamp_index();
        if self.focused_unselectable() {
            let saved = (self.order.clone(), self.index);
            if !self.skip_unselectable(Self::step_down) {
                (self.order, self.index) = saved;
            }
        }
    }

    pub fn up(&mut self) -> bool {
        self.navigate(Self::step_up)
    }

    pub fn down(&mut self) -> bool {
        self.navigate(Self::step_down)
    }

    /// `tab`: like `down`, but only when there is somewhere to go.
    pub fn next(&mut self) -> bool {
        self.limit() > 1 && self.down()
    }

    /// `shift+tab`: like `up`, but only when there is somewhere to go.
    pub fn prev(&mut self) -> bool {
        self.limit() > 1 && self.up()
    }

    /// Restore original order and focus the first choice.
    pub fn home(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.order = self.sorted_order();
        self.index = 0;
        self.settle_focus();
        true
    }

    /// Rotate so the last `limit` choices fill the window and focus the last one.
    pub fn end(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut order = self.sorted_order();
        let pos = order.len() - self.limit();
        order.rotate_left(pos);
        self.order = order;
        self.index = self.limit() - 1;
        if self.focused_unselectable() {
            let saved = (self.order.clone(), self.index);
            if !self.skip_unselectable(Self::step_up) {
                (self.order, self.index) = saved;
            }
        }
        true
    }

    /// Focus the top of the window.
    pub fn first(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.index = 0;
        self.settle_focus();
        true
    }

    /// Focus the bottom of the window.
    pub fn last(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.index = self.limit() - 1;
        if self.focused_unselectable() {
            let saved = (self.order.clone(), self.index);
            if !self.skip_unselectable(Self::step_up) {
                (self.order, self.index) = saved;
            }
        }
        true
    }

    /// Shrink the window by one row.
    pub fn page_up(&mut self) -> bool {
        let vis = self.limit();
        if vis <= 1 {
            return false;
        }
        self.limit = Some(vis - 1);
        self.clamp_index();
        if self.focused_unselectable() {
            self.up();
        }
        true
    }

    /// Grow the window by one row.
    pub fn page_down(&mut self) -> bool {
        let vis = self.limit();
        if vis >= self.order.len() {
            return false;
        }
        self.limit = Some((vis + 1).min(self.order.len()));
        if self.focused_unselectable() {
            self.down();
        }
        true
    }

    /// Sort mode: move the focused choice up one slot. Otherwise scroll the
    /// window up without moving focus.
    pub fn shift_up(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.sort {
            let len = self.order.len();
            let target = if self.index == 0 { len - 1 } else { self.index - 1 };
            self.order.swap(self.index, target);
            self.step_up();
            return true;
        }
        self.order.rotate_right(1);
        if self.focused_unselectable() {
            self.up();
        }
        true
    }

    /// Sort mode: move the focused choice down one slot. Otherwise scroll the
    /// window down without moving focus.
    pub fn shift_down(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.sort {
            let len = self.order.len();
            let target = if self.index + 1 >= len { 0 } else { self.index + 1 };
            self.order.swap(self.index, target);
            self.step_down();
            return true;
        }
        self.order.rotate_left(1);
        if self.focused_unselectable() {
            self.down();
        }
        true
    }

    /// Exchange the focused choice with the one at window position `pos`,
    /// wrapping past either end.
    pub fn swap(&mut self, pos: isize) -> bool {
        let len = self.order.len() as isize;
        if len < 2 {
            return false;
        }
        let target = if pos >= len {
            0
        } else if pos < 0 {
            len - 1
        } else {
            pos
        };
        self.order.swap(self.index, target as usize);
        true
    }

    /// Choices in their current display order (sort prompt answer).
    pub fn ordered(&self) -> impl Iterator<Item = &Choice> {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    /// Make `id` visible and focused. Returns false if `id` isn't in the list.
    ///
    /// Jumping backwards puts the target at the top of the window; jumping
    /// forwards puts it at the bottom.
    pub fn reveal(&mut self, id: ChoiceId) -> bool {
        if !self.order.contains(&id) {
            return false;
        }
        let vis = self.limit();
        if !self.visible_ids().contains(&id) {
            let mut order = self.sorted_order();
            let actual = order.iter().position(|c| *c == id).unwrap_or(0);
            let backwards = self.focused_id().is_some_and(|f| f > id);
            if backwards {
                order.rotate_left(actual);
            } else {
                order.rotate_left((actual + 1).saturating_sub(vis));
            }
            self.order = order;
        }
        self.index = self.order.iter().position(|c| *c == id).unwrap_or(0);
        true
    }

    /// Focus the choice whose name (or decimal index) is `key`.
    pub fn focus_named(&mut self, key: &str) -> bool {
        let found = self
            .arena
            .iter()
            .find(|c| c.name == key || key.parse::<usize>().ok() == Some(c.index.0))
            .map(|c| c.index);
        match found {
            Some(id) if !self.arena[id.0].is_unselectable() => self.reveal(id),
            _ => false,
        }
    }

    /// Quick-jump to the 1-based choice `number`. In multi-select the target is
    /// toggled as well.
    pub fn jump_to(&mut self, number: usize) -> bool {
        if number == 0 || number > self.arena.len() {
            return false;
        }
        let id = ChoiceId(number - 1);
        let Some(target) = self.get(id) else {
            return false;
        };
        if target.is_unselectable() {
            return false;
        }
        if self.multiple && !target.enabled && self.selected_count() >= self.max_selected {
            return false;
        }
        if !self.reveal(id) {
            return false;
        }
        if self.multiple {
            self.toggle(id, None);
        }
        true
    }

    /// Keep only choices matching `keep`, in original order, focus on the first.
    pub fn filter<F>(&mut self, keep: F)
    where
        F: Fn(&Choice) -> bool,
    {
        self.order = self
            .arena
            .iter()
            .filter(|c| keep(c))
            .map(|c| c.index)
            .collect();
        self.index = 0;
        self.settle_focus();
    }

    // ========================================================================
    // Selection
    // ========================================================================

    fn subtree(&self, id: ChoiceId) -> Vec<ChoiceId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            out.extend(self.arena[out[i].0].children.iter().copied());
            i += 1;
        }
        out
    }

    fn recompute_ancestors(&mut self, id: ChoiceId) {
        let mut parent = self.arena[id.0].parent;
        while let Some(pid) = parent {
            self.recompute_group(pid);
            parent = self.arena[pid.0].parent;
        }
    }

    /// A group is enabled iff all its selectable children are.
    fn recompute_group(&mut self, id: ChoiceId) {
        let children: Vec<bool> = self.arena[id.0]
            .children
            .iter()
            .map(|c| &self.arena[c.0])
            .filter(|c| !c.is_unselectable())
            .map(|c| c.enabled)
            .collect();
        if !children.is_empty() {
            self.arena[id.0].enabled = children.iter().all(|e| *e);
        }
    }

    fn recompute_all_groups(&mut self) {
        // Children always have larger handles than their parent.
        for i in (0..self.arena.len()).rev() {
            if self.arena[i].is_group() {
                self.recompute_group(ChoiceId(i));
            }
        }
    }

    /// Toggle `id` (or force it to `enabled`), cascading to every descendant
    /// and re-deriving every ancestor. Rejected if it would push the selected
    /// count past `max_selected`.
    pub fn toggle(&mut self, id: ChoiceId, enabled: Option<bool>) -> bool {
        let Some(choice) = self.get(id) else {
            return false;
        };
        if choice.is_unselectable() {
            return false;
        }
        let enabled = enabled.unwrap_or(!choice.enabled);
        let subtree = self.subtree(id);
        if enabled {
            let gained = subtree
                .iter()
                .map(|c| &self.arena[c.0])
                .filter(|c| !c.is_group() && !c.is_unselectable() && !c.enabled)
                .count();
            if gained > 0 && self.selected_count() + gained > self.max_selected {
                debug!("toggle rejected: max_selected {} reached", self.max_selected);
                return false;
            }
        }
        for c in subtree {
            let choice = &mut self.arena[c.0];
            if !choice.is_unselectable() {
                choice.enabled = enabled;
            }
        }
        self.recompute_ancestors(id);
        true
    }

    /// `space`: toggle the focused choice (multi-select only).
    pub fn toggle_focused(&mut self) -> bool {
        if !self.multiple {
            return false;
        }
        match self.focused_id() {
            Some(id) => self.toggle(id, None),
            None => false,
        }
    }

    fn selectable_leaves(&self) -> Vec<ChoiceId> {
        self.arena
            .iter()
            .filter(|c| !c.is_group() && !c.is_unselectable())
            .map(|c| c.index)
            .collect()
    }

    /// `a`: enable everything, or disable everything if all are enabled.
    pub fn toggle_all(&mut self) -> bool {
        if !self.multiple {
            return false;
        }
        let leaves = self.selectable_leaves();
        if self.max_selected < leaves.len() {
            return false;
        }
        let all_on = leaves.iter().all(|id| self.arena[id.0].enabled);
        for id in leaves {
            self.arena[id.0].enabled = !all_on;
        }
        self.recompute_all_groups();
        true
    }

    /// `i`: invert every selectable choice.
    pub fn invert(&mut self) -> bool {
        if !self.multiple {
            return false;
        }
        let leaves = self.selectable_leaves();
        if leaves.len() - self.selected_count() > self.max_selected {
            return false;
        }
        for id in leaves {
            let choice = &mut self.arena[id.0];
            choice.enabled = !choice.enabled;
        }
        self.recompute_all_groups();
        true
    }

    /// `g`: toggle the focused group (or the focused leaf's group). Without
    /// any nesting this is `toggle_all`.
    pub fn toggle_group(&mut self) -> bool {
        if !self.multiple {
            return false;
        }
        if self.arena.iter().all(|c| c.parent.is_none()) {
            return self.toggle_all();
        }
        let Some(focused) = self.focused() else {
            return false;
        };
        let target = match focused.parent {
            Some(parent) if !focused.is_group() => parent,
            _ => focused.index,
        };
        self.toggle(target, None)
    }
}
