use crate::event::event_bus::{CorrelationId, EventEnvelope, EventId};
use domain::event::DomainEvent;

/// 一次命令执行的追踪上下文，由它产生的所有事件共享同一个 correlation id。
#[derive(Debug, Clone)]
pub struct AppContext {
    pub event_id: EventId,
    pub correlation_id: CorrelationId,
    pub causation_id: EventId,
}

impl AppContext {
    pub fn new() -> Self {
        let event_id = EventId::new();
        Self {
            event_id: event_id.clone(),
            correlation_id: CorrelationId::new(),
            causation_id: event_id,
        }
    }

    /// 用当前上下文包装领域事件
    pub fn envelope<T: DomainEvent>(&self, event: T) -> EventEnvelope<T> {
        EventEnvelope::from_domain_event(event, self.correlation_id.clone(), self.event_id.clone())
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<&EventEnvelope<T>> for AppContext {
    fn from(envelope: &EventEnvelope<T>) -> Self {
        Self {
            event_id: envelope.id.clone(),
            correlation_id: envelope.correlation_id.clone(),
            causation_id: envelope.causation_id.clone(),
        }
    }
}
