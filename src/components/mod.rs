pub mod relation_graph;
