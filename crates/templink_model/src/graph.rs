//! Graphs and their item curves.

use crate::ids::{GraphId, GraphItemId, ItemId};
use crate::item::ItemKind;

/// How a y-axis bound is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisBound {
    /// Scale to the data.
    Calculated,
    /// Fixed to `yaxis_min` / `yaxis_max`.
    Fixed,
    /// Bound to the last value of an item.
    ItemValue,
}

/// A graph definition.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRow {
    /// Graph id.
    pub graph_id: GraphId,
    /// Graph name; the pairing key between template and host side.
    pub name: String,
    /// Pixel width.
    pub width: i32,
    /// Pixel height.
    pub height: i32,
    /// Fixed lower y bound.
    pub yaxis_min: f64,
    /// Fixed upper y bound.
    pub yaxis_max: f64,
    /// Shade the working time.
    pub show_work_period: i32,
    /// Overlay trigger lines.
    pub show_triggers: i32,
    /// Normal / stacked / pie / exploded, as its schema code.
    pub graph_type: i32,
    /// Show the legend.
    pub show_legend: i32,
    /// 3D rendering for pie charts.
    pub show_3d: i32,
    /// Left percentile line; 0 disables.
    pub percent_left: f64,
    /// Right percentile line; 0 disables.
    pub percent_right: f64,
    /// Lower bound mode.
    pub ymin_kind: AxisBound,
    /// Upper bound mode.
    pub ymax_kind: AxisBound,
    /// Item backing the lower bound when [`AxisBound::ItemValue`].
    pub ymin_item_id: Option<ItemId>,
    /// Item backing the upper bound when [`AxisBound::ItemValue`].
    pub ymax_item_id: Option<ItemId>,
    /// Entity flavour (normal / prototype / created).
    pub flags: ItemKind,
    /// Discover flag for prototypes.
    pub discover: i32,
    /// Parent graph on the linked template, null when locally created.
    pub template_id: Option<GraphId>,
}

impl GraphRow {
    /// A minimal graph with default presentation settings.
    pub fn new(graph_id: GraphId, name: impl Into<String>) -> Self {
        GraphRow {
            graph_id,
            name: name.into(),
            width: 900,
            height: 200,
            yaxis_min: 0.0,
            yaxis_max: 100.0,
            show_work_period: 1,
            show_triggers: 1,
            graph_type: 0,
            show_legend: 1,
            show_3d: 0,
            percent_left: 0.0,
            percent_right: 0.0,
            ymin_kind: AxisBound::Calculated,
            ymax_kind: AxisBound::Calculated,
            ymin_item_id: None,
            ymax_item_id: None,
            flags: ItemKind::Normal,
            discover: 0,
            template_id: None,
        }
    }
}

/// One curve of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphItemRow {
    /// Curve id.
    pub graph_item_id: GraphItemId,
    /// Owning graph.
    pub graph_id: GraphId,
    /// The plotted item.
    pub item_id: ItemId,
    /// Line / filled / dot / gradient, as its schema code.
    pub draw_type: i32,
    /// Ordering among the graph's curves.
    pub sort_order: i32,
    /// Hex colour.
    pub color: String,
    /// Left or right axis.
    pub yaxis_side: i32,
    /// Aggregation shown (min/avg/max/all/last), as its schema code.
    pub calc_fnc: i32,
    /// Simple or aggregated curve.
    pub item_type: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_axes_are_calculated() {
        let graph = GraphRow::new(5, "CPU usage");
        assert_eq!(graph.ymin_kind, AxisBound::Calculated);
        assert!(graph.ymin_item_id.is_none());
        assert!(graph.template_id.is_none());
    }
}
